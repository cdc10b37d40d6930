//! EMBERFALL Simulation Core
//!
//! Authoritative, tick-driven combat + AI симуляция на Bevy 0.16.
//!
//! AUTHORITY MODEL:
//! - Authority = единственный writer replicated полей (движение, урон, AI, stamps)
//! - Controller = поставляет input, cosmetics только предсказывает
//! - Observer = read-only зеркало, cosmetics через stamps + cursor replay
//!
//! FixedUpdate = authoritative tick, Update = render pass.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod collision;
pub mod combat;
pub mod components;
pub mod config;
pub mod error;
pub mod input;
pub mod locomotion;
pub mod logger;
pub mod navigation;
pub mod population;
pub mod presentation;
pub mod replication;
pub mod session;

// Re-export базовых типов для удобства
pub use ai::{AIConfig, AIPlugin, AIState};
pub use combat::{CombatPlugin, DamageDealt, Dead, EntityDied, MeleeCombat, RangedWeapon, ShotTrace};
pub use components::*;
pub use config::SimulationConfig;
pub use error::{ConfigError, SimError};
pub use input::{InputPlugin, PlayerInput};
pub use locomotion::{CharacterMotor, LocomotionPlugin};
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use population::{EnemySpawner, PopulationCommand, PopulationPlugin};
pub use presentation::{CosmeticCue, PresentationPlugin};
pub use replication::{NetworkRole, NetworkTick, ReplicationPlugin};
pub use session::{LocalPlayerRegistry, PeerJoined, PeerLeft, Session, SessionPlugin};

/// Фазы authoritative тика (FixedUpdate), строго по порядку
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Продвинуть NetworkTick
    Tick,
    /// Input → motor / TryAttack
    Input,
    /// Knockback, motors, nav agents
    Locomotion,
    /// Delayed damage, knockback requests, смерть
    Combat,
    /// Цели, FSM, pathing
    Ai,
    /// Спавн врагов, join / leave игроков
    Population,
    /// Despawn, респавн, registry
    Cleanup,
}

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// `SimulationConfig` и `DeterministicRng` берутся из App, если уже вставлены.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<SimulationConfig>() {
            app.insert_resource(SimulationConfig::default());
        }
        if !app.world().contains_resource::<DeterministicRng>() {
            // Детерминистичный RNG (seed по умолчанию)
            app.insert_resource(DeterministicRng::new(42));
        }

        let tick_rate = app.world().resource::<SimulationConfig>().tick_rate;

        app
            // Fixed timestep = tick rate substrate
            .insert_resource(Time::<Fixed>::from_hz(tick_rate as f64))
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Tick,
                    SimulationSet::Input,
                    SimulationSet::Locomotion,
                    SimulationSet::Combat,
                    SimulationSet::Ai,
                    SimulationSet::Population,
                    SimulationSet::Cleanup,
                )
                    .chain(),
            )
            .add_plugins((
                ReplicationPlugin { tick_rate },
                InputPlugin,
                LocomotionPlugin,
                CombatPlugin,
                AIPlugin,
                PopulationPlugin,
                SessionPlugin,
                PresentationPlugin,
            ));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Плагины симуляции тесты добавляют сами (`app.add_plugins(SimulationPlugin)`).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}
