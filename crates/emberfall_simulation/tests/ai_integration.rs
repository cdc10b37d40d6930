//! AI integration tests
//!
//! Idle → Chase → Attack на реальном расписании (10Hz), hysteresis ретаргета,
//! потеря цели и retry cooldown после провала pathing.

use bevy::prelude::*;
use emberfall_simulation::ai::{AIBrain, AIConfig, AIState};
use emberfall_simulation::collision::{layers, CollisionVolume};
use emberfall_simulation::combat::{DamageRequest, Knockback, KnockbackRequest};
use emberfall_simulation::config::EnemyData;
use emberfall_simulation::navigation::{NavAgent, Navigation, NavigationSurface};
use emberfall_simulation::population::EnemyArchetype;
use emberfall_simulation::replication::{CombatStamps, EventKind, NetId, TickTimer};
use emberfall_simulation::*;

fn create_ai_app() -> App {
    let mut config = SimulationConfig::default();
    config.tick_rate = 10.0;
    config.spawner.auto_spawn = false;

    let mut app = create_headless_app(7);
    app.insert_resource(config).add_plugins(SimulationPlugin);
    app
}

fn step(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.world_mut().run_schedule(FixedUpdate);
    }
}

/// Helper: неподвижная цель-игрок
fn spawn_target(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Actor {
                faction_id: FACTION_PLAYERS,
            },
            NetworkRole::Authority,
            Position(position),
            CollisionVolume::on_layer(layers::PLAYERS),
        ))
        .id()
}

fn spawn_enemy(app: &mut App, position: Vec3, data: EnemyData) -> Entity {
    let archetype = EnemyArchetype::new("grunt", false, Some(data));
    let bundle = archetype.bundle(NetId(100), position, &AIConfig::default());
    app.world_mut().spawn(bundle).id()
}

fn state(app: &App, entity: Entity) -> AIState {
    *app.world().get::<AIState>(entity).unwrap()
}

fn brain(app: &App, entity: Entity) -> AIBrain {
    app.world().get::<AIBrain>(entity).unwrap().clone()
}

#[test]
fn test_enemy_chases_and_attacks_player() {
    let mut app = create_ai_app();
    let player = spawn_target(&mut app, Vec3::ZERO);
    let enemy = spawn_enemy(&mut app, Vec3::new(-6.0, 0.0, 0.0), EnemyData::default());

    step(&mut app, 1);
    assert_eq!(brain(&app, enemy).target, Some(player));
    assert_eq!(state(&app, enemy), AIState::Chase);
    assert!(app.world().get::<NavAgent>(enemy).unwrap().destination.is_some());

    // Догоняет (5 m/s, stopping distance 1.5)
    step(&mut app, 15);
    let enemy_pos = app.world().get::<Position>(enemy).unwrap().0;
    assert!(enemy_pos.x > -3.0, "enemy should have closed in, at {:?}", enemy_pos);
    assert_eq!(state(&app, enemy), AIState::Attack);

    step(&mut app, 10);
    let stamps = app.world().get::<CombatStamps>(enemy).unwrap();
    assert!(stamps.get(EventKind::Swing).has_fired());
    assert!(stamps.get(EventKind::Landed).has_fired());
    assert!(app.world().get::<Health>(player).unwrap().current < 100.0);
}

#[test]
fn test_attack_exits_back_to_chase_when_target_escapes() {
    let mut app = create_ai_app();
    let player = spawn_target(&mut app, Vec3::ZERO);
    let enemy = spawn_enemy(&mut app, Vec3::new(-1.8, 0.0, 0.0), EnemyData::default());

    step(&mut app, 2);
    assert_eq!(state(&app, enemy), AIState::Attack);

    // 2.2m < 2.0 · 1.2: ещё Attack (hysteresis выхода)
    let enemy_pos = app.world().get::<Position>(enemy).unwrap().0;
    app.world_mut().get_mut::<Position>(player).unwrap().0 = enemy_pos + Vec3::new(2.2, 0.0, 0.0);
    step(&mut app, 1);
    assert_eq!(state(&app, enemy), AIState::Attack);

    let enemy_pos = app.world().get::<Position>(enemy).unwrap().0;
    app.world_mut().get_mut::<Position>(player).unwrap().0 = enemy_pos + Vec3::new(8.0, 0.0, 0.0);
    step(&mut app, 1);
    assert_eq!(state(&app, enemy), AIState::Chase);
}

#[test]
fn test_retarget_uses_switch_hysteresis() {
    let mut app = create_ai_app();
    // Неподвижный враг: дистанции меняем только мы
    let statue = EnemyData {
        movement_speed: 0.0,
        ..EnemyData::default()
    };
    let enemy = spawn_enemy(&mut app, Vec3::ZERO, statue);
    let first = spawn_target(&mut app, Vec3::new(4.0, 0.0, 0.0));
    let second = spawn_target(&mut app, Vec3::new(0.0, 0.0, 5.0));

    step(&mut app, 1);
    assert_eq!(brain(&app, enemy).target, Some(first));

    // 3.5 / 4.0 = 0.875 ≥ 0.7 → остаёмся
    app.world_mut().get_mut::<Position>(second).unwrap().0 = Vec3::new(0.0, 0.0, 3.5);
    step(&mut app, 1);
    assert_eq!(brain(&app, enemy).target, Some(first));

    // 2.5 / 4.0 = 0.625 < 0.7 → переключаемся
    app.world_mut().get_mut::<Position>(second).unwrap().0 = Vec3::new(0.0, 0.0, 2.5);
    step(&mut app, 1);
    assert_eq!(brain(&app, enemy).target, Some(second));
}

#[test]
fn test_lost_target_is_replaced_immediately() {
    let mut app = create_ai_app();
    let statue = EnemyData {
        movement_speed: 0.0,
        ..EnemyData::default()
    };
    let enemy = spawn_enemy(&mut app, Vec3::ZERO, statue);
    let near = spawn_target(&mut app, Vec3::new(4.0, 0.0, 0.0));
    let far = spawn_target(&mut app, Vec3::new(-8.0, 0.0, 0.0));

    step(&mut app, 1);
    assert_eq!(brain(&app, enemy).target, Some(near));

    app.world_mut().despawn(near);
    step(&mut app, 1);
    assert_eq!(brain(&app, enemy).target, Some(far));
    assert_eq!(state(&app, enemy), AIState::Chase);
}

#[test]
fn test_dead_target_returns_enemy_to_idle() {
    let mut app = create_ai_app();
    let player = spawn_target(&mut app, Vec3::ZERO);
    let enemy = spawn_enemy(&mut app, Vec3::new(-6.0, 0.0, 0.0), EnemyData::default());

    step(&mut app, 1);
    assert_eq!(state(&app, enemy), AIState::Chase);

    app.world_mut().send_event(DamageRequest {
        target: player,
        amount: 1000.0,
        source: None,
    });
    step(&mut app, 2);

    assert!(app.world().get::<Dead>(player).is_some());
    assert_eq!(brain(&app, enemy).target, None);
    assert_eq!(state(&app, enemy), AIState::Idle);
}

#[test]
fn test_dead_enemy_enters_terminal_state() {
    let mut app = create_ai_app();
    spawn_target(&mut app, Vec3::ZERO);
    let enemy = spawn_enemy(&mut app, Vec3::new(-6.0, 0.0, 0.0), EnemyData::default());

    step(&mut app, 1);
    app.world_mut().send_event(DamageRequest {
        target: enemy,
        amount: 1000.0,
        source: None,
    });
    step(&mut app, 2);

    assert_eq!(state(&app, enemy), AIState::Dead);
    assert!(!app.world().get::<NavAgent>(enemy).unwrap().enabled);

    // Dead: терминальное состояние
    let frozen = app.world().get::<Position>(enemy).unwrap().0;
    step(&mut app, 5);
    assert_eq!(state(&app, enemy), AIState::Dead);
    assert_eq!(app.world().get::<Position>(enemy).unwrap().0, frozen);
}

/// Surface без единой достижимой точки (pathing всегда проваливается)
struct NowhereToGo;

impl NavigationSurface for NowhereToGo {
    fn sample_point(&self, _near: Vec3, _max_radius: f32) -> Option<Vec3> {
        None
    }

    fn is_reachable(&self, _from: Vec3, _to: Vec3) -> bool {
        false
    }

    fn ground_height(&self, _at: Vec3) -> Option<f32> {
        Some(0.0)
    }
}

#[test]
fn test_navigation_failure_backs_off_to_idle() {
    let mut app = create_ai_app();
    app.insert_resource(Navigation::new(NowhereToGo));
    spawn_target(&mut app, Vec3::ZERO);
    let enemy = spawn_enemy(&mut app, Vec3::new(-6.0, 0.0, 0.0), EnemyData::default());

    step(&mut app, 1);
    assert_eq!(state(&app, enemy), AIState::Idle);
    let after_failure = brain(&app, enemy);
    assert_eq!(after_failure.target, None);
    // idle_retry_cooldown 1.0s = 10 тиков от тика 1
    assert_eq!(after_failure.retry, TickTimer::Running { target_tick: 11 });

    // Пока retry не истёк: цель не ищем
    step(&mut app, 5);
    assert_eq!(brain(&app, enemy).target, None);

    // Тик 11: новая попытка → снова провал → новый cooldown
    step(&mut app, 5);
    assert_eq!(brain(&app, enemy).retry, TickTimer::Running { target_tick: 21 });
    assert_eq!(state(&app, enemy), AIState::Idle);
}

/// Цель за краем арены (30м): sample в 2м пуст, в расширенных 4м находит край
#[test]
fn test_chase_widens_destination_search() {
    let mut app = create_ai_app();
    let player = spawn_target(&mut app, Vec3::new(33.5, 0.0, 0.0));
    let enemy = spawn_enemy(&mut app, Vec3::new(24.0, 0.0, 0.0), EnemyData::default());

    step(&mut app, 1);
    assert_eq!(brain(&app, enemy).target, Some(player));
    assert_eq!(state(&app, enemy), AIState::Chase);
    assert_eq!(brain(&app, enemy).retry, TickTimer::NotRunning);

    let destination = app.world().get::<NavAgent>(enemy).unwrap().destination.unwrap();
    assert!((destination.x - 30.0).abs() < 1e-4, "destination {:?}", destination);

    step(&mut app, 3);
    assert_eq!(state(&app, enemy), AIState::Chase);
    assert!(app.world().get::<Position>(enemy).unwrap().0.x > 24.0);
}

/// Knockback замораживает и поиск цели, не только FSM
#[test]
fn test_knockback_freezes_target_acquisition() {
    let mut app = create_ai_app();
    let statue = EnemyData {
        movement_speed: 0.0,
        ..EnemyData::default()
    };
    let enemy = spawn_enemy(&mut app, Vec3::ZERO, statue);
    app.world_mut().send_event(KnockbackRequest {
        target: enemy,
        impulse: Vec3::new(0.0, 0.0, 0.5),
    });
    let player = spawn_target(&mut app, Vec3::new(4.0, 0.0, 0.0));

    step(&mut app, 1);
    assert!(app.world().get::<Knockback>(enemy).unwrap().is_active());
    assert_eq!(brain(&app, enemy).target, None);
    assert_eq!(state(&app, enemy), AIState::Idle);

    // Knockback 0.3s → после приземления цель находится
    step(&mut app, 5);
    assert!(!app.world().get::<Knockback>(enemy).unwrap().is_active());
    assert_eq!(brain(&app, enemy).target, Some(player));
}

#[test]
fn test_observer_ai_is_inert() {
    let mut app = create_ai_app();
    spawn_target(&mut app, Vec3::ZERO);
    let enemy = spawn_enemy(&mut app, Vec3::new(-6.0, 0.0, 0.0), EnemyData::default());
    app.world_mut().entity_mut(enemy).insert(NetworkRole::Observer);

    step(&mut app, 10);
    assert_eq!(state(&app, enemy), AIState::Idle);
    assert_eq!(brain(&app, enemy).target, None);
    assert_eq!(app.world().get::<Position>(enemy).unwrap().0, Vec3::new(-6.0, 0.0, 0.0));
}
