//! Headless симуляция EMBERFALL
//!
//! Host + один клиент в одном процессе: authority мир шагает тики, клиентский
//! мир получает snapshot каждые несколько тиков и проигрывает cosmetics.
//!
//! Использование: `emberfall_simulation [config.ron]`

use bevy::prelude::*;
use emberfall_simulation::replication::{apply_snapshot, capture_snapshot};
use emberfall_simulation::session::{PeerJoined, Session};
use emberfall_simulation::{
    create_headless_app, log_error, log_info, CosmeticCue, EnemySpawner, NetworkRole, PeerId, PlayerInput,
    SimulationConfig, SimulationPlugin,
};

const HOST: PeerId = PeerId(1);
const CLIENT: PeerId = PeerId(2);
const TICKS: u64 = 1200;
const SNAPSHOT_EVERY: u64 = 3;

fn load_config() -> SimulationConfig {
    let Some(path) = std::env::args().nth(1) else {
        return SimulationConfig::default();
    };
    match SimulationConfig::from_file(&path) {
        Ok(config) => {
            log_info(&format!("📄 Config loaded from {}", path));
            config
        }
        Err(err) => {
            log_error(&format!("❌ Failed to load {}: {} (using defaults)", path, err));
            SimulationConfig::default()
        }
    }
}

fn build_peer(seed: u64, config: &SimulationConfig, session: Session) -> App {
    let mut app = create_headless_app(seed);
    app.insert_resource(config.clone())
        .insert_resource(session)
        .add_plugins(SimulationPlugin);
    app
}

fn main() {
    let seed = 42;
    let config = load_config();
    println!("Starting EMBERFALL headless simulation (seed: {})", seed);

    let mut host = build_peer(seed, &config, Session::host(HOST));
    let mut client = build_peer(seed, &config, Session::client(CLIENT));

    host.world_mut().spawn((EnemySpawner::default(), NetworkRole::Authority));
    host.world_mut().send_event(PeerJoined { peer: HOST });
    host.world_mut().send_event(PeerJoined { peer: CLIENT });

    let mut client_cues = 0usize;
    for tick in 1..=TICKS {
        // Игроки рубят и стреляют во всё подряд
        let mut inputs = host.world_mut().query::<&mut PlayerInput>();
        for mut input in inputs.iter_mut(host.world_mut()) {
            input.movement = Vec2::new(0.0, 0.5);
            if tick % 30 == 0 {
                input.press_attack();
            }
            if tick % 45 == 0 {
                input.press_shoot(None);
            }
        }

        host.world_mut().run_schedule(FixedUpdate);
        host.world_mut().run_schedule(Update);

        if tick % SNAPSHOT_EVERY == 0 {
            let state = capture_snapshot(host.world_mut());
            apply_snapshot(client.world_mut(), &state, Some(CLIENT));
            client.world_mut().run_schedule(Update);

            client_cues += client.world_mut().resource_mut::<Events<CosmeticCue>>().drain().count();
        }

        if tick % 120 == 0 {
            let state = capture_snapshot(host.world_mut());
            println!(
                "Tick {}: {} replicated entities, {} cosmetic cues on client",
                tick,
                state.entities.len(),
                client_cues
            );
        }
    }

    println!("Simulation complete!");
}
