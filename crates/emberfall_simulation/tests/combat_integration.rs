//! Combat integration tests
//!
//! Шагаем FixedUpdate вручную при 10Hz (0.1s на тик), чтобы тайминги были целыми:
//! windup 0.3s = 3 тика, cooldown 0.8s = 8 тиков, respawn 3s = 30 тиков.
//!
//! Проверяем:
//! - delayed damage (windup → урон → Landed)
//! - interrupt входящим уроном
//! - блок, heal, authority gate
//! - смерть: despawn врага, respawn игрока
//! - knockback (clamp вертикали один раз)
//! - hitscan выстрел (fire rate, стены, impact point)

use bevy::prelude::*;
use emberfall_simulation::collision::{layers, Aabb, CollisionVolume, Obstacles};
use emberfall_simulation::combat::{
    DamageRequest, HealRequest, Knockback, KnockbackRequest, RangedWeapon, Respawning, ShotImpact, ShotTrace,
};
use emberfall_simulation::config::MeleeData;
use emberfall_simulation::replication::{CombatStamps, EventKind, TickTimer};
use emberfall_simulation::*;

/// Helper: App с полной симуляцией, 10Hz, без автоспавна врагов
fn create_combat_app() -> App {
    let mut config = SimulationConfig::default();
    config.tick_rate = 10.0;
    config.spawner.auto_spawn = false;

    let mut app = create_headless_app(42);
    app.insert_resource(config).add_plugins(SimulationPlugin);
    app
}

fn step(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.world_mut().run_schedule(FixedUpdate);
    }
}

fn current_tick(app: &App) -> u64 {
    app.world().resource::<NetworkTick>().tick
}

/// Helper: authority игрок с melee (без knockback, если не сказано иное)
fn spawn_fighter(app: &mut App, position: Vec3, melee: MeleeData) -> Entity {
    app.world_mut()
        .spawn((
            Actor {
                faction_id: FACTION_PLAYERS,
            },
            Player {
                owner: PeerId(1),
                spawn_point: position,
            },
            NetworkRole::Authority,
            Position(position),
            CharacterMotor::default(),
            MeleeCombat::new(melee),
            CollisionVolume::on_layer(layers::PLAYERS),
            PlayerInput::default(),
        ))
        .id()
}

/// Helper: неподвижный враг-манекен (без AI)
fn spawn_dummy(app: &mut App, position: Vec3, role: NetworkRole) -> Entity {
    app.world_mut()
        .spawn((
            Actor {
                faction_id: FACTION_ENEMIES,
            },
            Enemy {
                archetype: "dummy".into(),
                elite: false,
            },
            role,
            Health::new(100.0),
            Position(position),
            MeleeCombat::default(),
            CollisionVolume::on_layer(layers::ENEMIES),
        ))
        .id()
}

fn no_knockback() -> MeleeData {
    MeleeData {
        knockback_force: 0.0,
        knockback_lift: 0.0,
        ..MeleeData::default()
    }
}

fn press_attack(app: &mut App, entity: Entity) {
    app.world_mut().get_mut::<PlayerInput>(entity).unwrap().press_attack();
}

fn health(app: &App, entity: Entity) -> f32 {
    app.world().get::<Health>(entity).unwrap().current
}

fn stamp(app: &App, entity: Entity, kind: EventKind) -> u64 {
    app.world().get::<CombatStamps>(entity).unwrap().get(kind).tick()
}

/// Scenario A: windup 0.3s, cooldown 0.8s
#[test]
fn test_delayed_damage_timeline() {
    let mut app = create_combat_app();
    let attacker = spawn_fighter(&mut app, Vec3::ZERO, no_knockback());
    let victim = spawn_dummy(&mut app, Vec3::new(0.0, 0.0, 1.0), NetworkRole::Authority);

    press_attack(&mut app, attacker);
    step(&mut app, 1);
    assert_eq!(current_tick(&app), 1);
    assert_eq!(stamp(&app, attacker, EventKind::Swing), 1);
    assert!(app.world().get::<MeleeCombat>(attacker).unwrap().pending_damage);

    // Windup: урона ещё нет
    step(&mut app, 2);
    assert_eq!(health(&app, victim), 100.0);

    // Тик 4: windup истёк
    step(&mut app, 1);
    assert_eq!(health(&app, victim), 75.0);
    assert_eq!(stamp(&app, attacker, EventKind::Landed), 4);
    assert_eq!(stamp(&app, victim, EventKind::Hit), 4);
    assert!(!app.world().get::<MeleeCombat>(attacker).unwrap().pending_damage);

    // Тик 8: cooldown (до тика 9) ещё идёт
    step(&mut app, 3);
    press_attack(&mut app, attacker);
    step(&mut app, 1);
    assert_eq!(current_tick(&app), 8);
    assert_eq!(stamp(&app, attacker, EventKind::Swing), 1);

    // Тик 9: можно снова
    press_attack(&mut app, attacker);
    step(&mut app, 1);
    assert_eq!(stamp(&app, attacker, EventKind::Swing), 9);
}

/// Scenario B: урон во время windup отменяет атаку и сбрасывает cooldown
#[test]
fn test_incoming_damage_interrupts_windup() {
    let mut app = create_combat_app();
    let attacker = spawn_fighter(&mut app, Vec3::ZERO, no_knockback());
    let victim = spawn_dummy(&mut app, Vec3::new(0.0, 0.0, 1.0), NetworkRole::Authority);

    press_attack(&mut app, attacker);
    step(&mut app, 1);

    app.world_mut().send_event(DamageRequest {
        target: attacker,
        amount: 10.0,
        source: Some(victim),
    });
    step(&mut app, 1);

    let combat = app.world().get::<MeleeCombat>(attacker).unwrap();
    assert!(!combat.pending_damage);
    assert_eq!(combat.cooldown, TickTimer::NotRunning);
    assert_eq!(health(&app, attacker), 90.0);
    assert_eq!(stamp(&app, attacker, EventKind::Hit), 2);

    // Удар так и не долетел
    step(&mut app, 2);
    assert_eq!(health(&app, victim), 100.0);
    assert_eq!(stamp(&app, attacker, EventKind::Landed), 0);

    // Cooldown сброшен: атака сразу доступна
    press_attack(&mut app, attacker);
    step(&mut app, 1);
    assert_eq!(stamp(&app, attacker, EventKind::Swing), 5);
}

#[test]
fn test_blocking_absorbs_damage() {
    let mut app = create_combat_app();
    let defender = spawn_fighter(&mut app, Vec3::ZERO, no_knockback());

    app.world_mut().get_mut::<PlayerInput>(defender).unwrap().block = true;
    step(&mut app, 1);

    app.world_mut().send_event(DamageRequest {
        target: defender,
        amount: 40.0,
        source: None,
    });
    step(&mut app, 1);

    assert_eq!(health(&app, defender), 100.0);
    assert_eq!(stamp(&app, defender, EventKind::Blocked), 2);
    assert_eq!(stamp(&app, defender, EventKind::Hit), 0);
}

#[test]
fn test_heal_clamped_to_max() {
    let mut app = create_combat_app();
    let victim = spawn_dummy(&mut app, Vec3::ZERO, NetworkRole::Authority);

    app.world_mut().send_event(DamageRequest {
        target: victim,
        amount: 30.0,
        source: None,
    });
    step(&mut app, 1);
    assert_eq!(health(&app, victim), 70.0);

    app.world_mut().send_event(HealRequest {
        target: victim,
        amount: 500.0,
    });
    step(&mut app, 1);
    assert_eq!(health(&app, victim), 100.0);
}

#[test]
fn test_non_authority_state_is_never_mutated() {
    let mut app = create_combat_app();
    let mirror = spawn_dummy(&mut app, Vec3::ZERO, NetworkRole::Observer);

    app.world_mut().send_event(DamageRequest {
        target: mirror,
        amount: 50.0,
        source: None,
    });
    app.world_mut().send_event(KnockbackRequest {
        target: mirror,
        impulse: Vec3::new(5.0, 5.0, 0.0),
    });
    step(&mut app, 3);

    assert_eq!(health(&app, mirror), 100.0);
    assert_eq!(*app.world().get::<CombatStamps>(mirror).unwrap(), CombatStamps::default());
    assert!(!app.world().get::<Knockback>(mirror).unwrap().is_active());
    assert_eq!(app.world().get::<Position>(mirror).unwrap().0, Vec3::ZERO);
}

/// Scenario C (враг): смерть → Dead → despawn через 3s
#[test]
fn test_enemy_death_and_despawn() {
    let mut app = create_combat_app();
    let victim = spawn_dummy(&mut app, Vec3::ZERO, NetworkRole::Authority);

    app.world_mut().send_event(DamageRequest {
        target: victim,
        amount: 150.0,
        source: None,
    });
    step(&mut app, 1);

    assert_eq!(health(&app, victim), 0.0);
    assert!(app.world().get::<Dead>(victim).is_some());
    assert_eq!(stamp(&app, victim, EventKind::Death), 1);
    assert!(!app.world().get::<CollisionVolume>(victim).unwrap().enabled);

    // Повторная смерть не стампится
    app.world_mut().send_event(DamageRequest {
        target: victim,
        amount: 10.0,
        source: None,
    });
    step(&mut app, 1);
    assert_eq!(stamp(&app, victim, EventKind::Death), 1);

    step(&mut app, 28);
    assert!(app.world().get_entity(victim).is_ok());
    step(&mut app, 1);
    assert!(app.world().get_entity(victim).is_err(), "enemy must despawn 3s after death");
}

/// Scenario C (игрок): смерть → respawn в spawn point с полным здоровьем
#[test]
fn test_player_death_and_respawn() {
    let mut app = create_combat_app();
    let spawn_point = Vec3::new(2.0, 0.0, -2.0);
    let player = spawn_fighter(&mut app, spawn_point, no_knockback());

    app.world_mut().send_event(DamageRequest {
        target: player,
        amount: 150.0,
        source: None,
    });
    step(&mut app, 1);
    assert!(app.world().get::<Dead>(player).is_some());
    assert!(app.world().get::<Respawning>(player).is_some());

    // Мёртвый не атакует
    app.world_mut().get_mut::<Position>(player).unwrap().0 = Vec3::new(9.0, 0.0, 9.0);
    press_attack(&mut app, player);
    step(&mut app, 1);
    assert_eq!(stamp(&app, player, EventKind::Swing), 0);

    step(&mut app, 28);
    assert!(app.world().get::<Dead>(player).is_some());

    step(&mut app, 1);
    assert!(app.world().get::<Dead>(player).is_none());
    assert!(app.world().get::<Respawning>(player).is_none());
    assert_eq!(health(&app, player), 100.0);
    let position = app.world().get::<Position>(player).unwrap().0;
    assert!((position - spawn_point).length() < 0.1, "respawned at {:?}", position);
    assert!(app.world().get::<CollisionVolume>(player).unwrap().enabled);
}

/// Scenario E: вертикаль knockback clamp'ится один раз, дальше только гравитация
#[test]
fn test_knockback_clamps_upward_once() {
    let mut app = create_combat_app();
    let victim = spawn_dummy(&mut app, Vec3::ZERO, NetworkRole::Authority);

    app.world_mut().send_event(KnockbackRequest {
        target: victim,
        impulse: Vec3::new(3.0, 50.0, 0.0),
    });
    step(&mut app, 1);

    let knockback = *app.world().get::<Knockback>(victim).unwrap();
    assert!(knockback.is_active());
    assert_eq!(knockback.velocity.y, 4.0);

    step(&mut app, 1);
    let knockback = *app.world().get::<Knockback>(victim).unwrap();
    assert!((knockback.velocity.y - 2.0).abs() < 1e-4);
    let position = app.world().get::<Position>(victim).unwrap().0;
    assert!((position.x - 0.3).abs() < 1e-4);
    assert!(position.y > 0.0);

    // 0.3s = 3 тика от тика 1 → завершение на тике 4, snap на пол
    step(&mut app, 2);
    let knockback = *app.world().get::<Knockback>(victim).unwrap();
    assert!(!knockback.is_active());
    assert_eq!(app.world().get::<Position>(victim).unwrap().0.y, 0.0);
}

#[test]
fn test_melee_knockback_only_for_survivors() {
    let mut app = create_combat_app();
    let attacker = spawn_fighter(&mut app, Vec3::ZERO, MeleeData::default());
    let survivor = spawn_dummy(&mut app, Vec3::new(0.3, 0.0, 1.0), NetworkRole::Authority);
    let doomed = spawn_dummy(&mut app, Vec3::new(-0.3, 0.0, 1.0), NetworkRole::Authority);
    app.world_mut().get_mut::<Health>(doomed).unwrap().current = 10.0;

    press_attack(&mut app, attacker);
    step(&mut app, 4);

    assert_eq!(health(&app, survivor), 75.0);
    assert!(app.world().get::<Knockback>(survivor).unwrap().is_active());
    assert!(app.world().get::<Dead>(doomed).is_some());
    assert!(!app.world().get::<Knockback>(doomed).unwrap().is_active());
    assert_eq!(stamp(&app, attacker, EventKind::Landed), 4);
}

/// Scenario A: попадание считается в момент окончания windup, а не при замахе
#[test]
fn test_hit_volume_checked_when_windup_expires() {
    let mut app = create_combat_app();
    let attacker = spawn_fighter(&mut app, Vec3::ZERO, no_knockback());
    let leaving = spawn_dummy(&mut app, Vec3::new(0.0, 0.0, 1.0), NetworkRole::Authority);
    let entering = spawn_dummy(&mut app, Vec3::new(0.0, 0.0, 6.0), NetworkRole::Authority);

    press_attack(&mut app, attacker);
    step(&mut app, 3);
    assert_eq!(current_tick(&app), 3);

    // Перед тиком 4 (t = 0.3s) меняются местами
    app.world_mut().get_mut::<Position>(leaving).unwrap().0 = Vec3::new(0.0, 0.0, 6.0);
    app.world_mut().get_mut::<Position>(entering).unwrap().0 = Vec3::new(0.3, 0.0, 1.0);
    step(&mut app, 1);

    assert_eq!(health(&app, entering), 75.0);
    assert_eq!(stamp(&app, entering, EventKind::Hit), 4);
    assert_eq!(health(&app, leaving), 100.0);
    assert_eq!(stamp(&app, leaving, EventKind::Hit), 0);
    assert_eq!(stamp(&app, attacker, EventKind::Landed), 4);
}

/// Два fighter'а лицом к лицу, оба замахнулись на тике 1
fn spawn_duel(app: &mut App) -> (Entity, Entity) {
    let first = spawn_fighter(app, Vec3::ZERO, no_knockback());
    let second = spawn_fighter(app, Vec3::new(0.0, 0.0, 1.0), no_knockback());
    app.world_mut()
        .entity_mut(second)
        .insert(Orientation::from_yaw(std::f32::consts::PI));

    press_attack(app, first);
    press_attack(app, second);
    step(app, 1);
    assert!(app.world().get::<MeleeCombat>(first).unwrap().pending_damage);
    assert!(app.world().get::<MeleeCombat>(second).unwrap().pending_damage);
    (first, second)
}

/// Удары одного тика: первый (по Entity) прерывает windup второго
#[test]
fn test_same_tick_swing_interrupts_other_windup() {
    let mut app = create_combat_app();
    let (first, second) = spawn_duel(&mut app);

    step(&mut app, 3);
    assert_eq!(health(&app, second), 75.0);
    assert_eq!(health(&app, first), 100.0);
    assert_eq!(stamp(&app, first, EventKind::Landed), 4);
    assert_eq!(stamp(&app, second, EventKind::Landed), 0);

    // Прерванный атакующий может сразу атаковать снова
    let combat = app.world().get::<MeleeCombat>(second).unwrap();
    assert!(!combat.pending_damage);
    assert_eq!(combat.cooldown, TickTimer::NotRunning);
}

/// Атакующий, убитый на том же тике, не наносит урон
#[test]
fn test_attacker_killed_same_tick_deals_no_damage() {
    let mut app = create_combat_app();
    let (first, second) = spawn_duel(&mut app);
    app.world_mut().get_mut::<Health>(second).unwrap().current = 10.0;

    step(&mut app, 3);
    assert_eq!(health(&app, second), 0.0);
    assert!(app.world().get::<Dead>(second).is_some());
    assert_eq!(stamp(&app, second, EventKind::Death), 4);
    assert_eq!(health(&app, first), 100.0);
    assert_eq!(stamp(&app, first, EventKind::Hit), 0);
    assert_eq!(stamp(&app, second, EventKind::Landed), 0);
}

/// Helper: стрелок с default оружием (10 урона, 1 выстрел/с), смотрит в +Z
fn spawn_shooter(app: &mut App, position: Vec3) -> Entity {
    let shooter = spawn_fighter(app, position, no_knockback());
    app.world_mut()
        .entity_mut(shooter)
        .insert((RangedWeapon::default(), ShotTrace::default()));
    shooter
}

fn press_shoot(app: &mut App, entity: Entity, aim_point: Option<Vec3>) {
    app.world_mut().get_mut::<PlayerInput>(entity).unwrap().press_shoot(aim_point);
}

fn impact(app: &App, entity: Entity) -> Option<ShotImpact> {
    app.world().get::<ShotTrace>(entity).unwrap().impact
}

#[test]
fn test_shot_damages_first_actor_instantly() {
    let mut app = create_combat_app();
    let shooter = spawn_shooter(&mut app, Vec3::ZERO);
    let dummy = spawn_dummy(&mut app, Vec3::new(0.0, 0.0, 5.0), NetworkRole::Authority);

    press_shoot(&mut app, shooter, None);
    step(&mut app, 1);

    // Без windup: урон на том же тике
    assert_eq!(health(&app, dummy), 90.0);
    assert_eq!(stamp(&app, shooter, EventKind::Shot), 1);
    assert_eq!(stamp(&app, shooter, EventKind::Swing), 0);
    assert_eq!(stamp(&app, dummy, EventKind::Hit), 1);

    // Луч с высоты глаз (1.6) входит в капсулу радиуса 0.5
    let hit = impact(&app, shooter).expect("shot should record an impact");
    assert!(hit.point.abs_diff_eq(Vec3::new(0.0, 1.6, 4.5), 1e-4), "impact {:?}", hit.point);
    assert!(hit.normal.abs_diff_eq(Vec3::NEG_Z, 1e-4));
}

#[test]
fn test_fire_rate_limits_shots() {
    let mut app = create_combat_app();
    let shooter = spawn_shooter(&mut app, Vec3::ZERO);
    let dummy = spawn_dummy(&mut app, Vec3::new(0.0, 0.0, 5.0), NetworkRole::Authority);

    // Жмём каждый тик: 1 выстрел/с → тики 1 и 11
    for _ in 0..10 {
        press_shoot(&mut app, shooter, None);
        step(&mut app, 1);
    }
    assert_eq!(health(&app, dummy), 90.0);
    assert_eq!(stamp(&app, shooter, EventKind::Shot), 1);

    press_shoot(&mut app, shooter, None);
    step(&mut app, 1);
    assert_eq!(current_tick(&app), 11);
    assert_eq!(health(&app, dummy), 80.0);
    assert_eq!(stamp(&app, shooter, EventKind::Shot), 11);
}

#[test]
fn test_wall_stops_shot() {
    let mut app = create_combat_app();
    app.insert_resource(Obstacles::new(vec![Aabb::from_center(
        Vec3::new(0.0, 1.0, 2.5),
        Vec3::new(2.0, 2.0, 0.2),
    )]));
    let shooter = spawn_shooter(&mut app, Vec3::ZERO);
    let dummy = spawn_dummy(&mut app, Vec3::new(0.0, 0.0, 5.0), NetworkRole::Authority);

    press_shoot(&mut app, shooter, None);
    step(&mut app, 1);

    assert_eq!(health(&app, dummy), 100.0);
    assert_eq!(stamp(&app, shooter, EventKind::Shot), 1);
    let hit = impact(&app, shooter).expect("wall impact should be recorded");
    assert!((hit.point.z - 2.3).abs() < 1e-4, "impact {:?}", hit.point);
    assert!(hit.normal.abs_diff_eq(Vec3::NEG_Z, 1e-4));
}

#[test]
fn test_shot_follows_aim_point() {
    let mut app = create_combat_app();
    let shooter = spawn_shooter(&mut app, Vec3::ZERO);
    let ahead = spawn_dummy(&mut app, Vec3::new(0.0, 0.0, 5.0), NetworkRole::Authority);
    let aside = spawn_dummy(&mut app, Vec3::new(4.0, 0.0, 0.0), NetworkRole::Authority);

    // Смотрим в +Z, целимся в +X
    press_shoot(&mut app, shooter, Some(Vec3::new(4.0, 1.6, 0.0)));
    step(&mut app, 1);

    assert_eq!(health(&app, ahead), 100.0);
    assert_eq!(health(&app, aside), 90.0);
}

#[test]
fn test_missed_shot_leaves_no_impact() {
    let mut app = create_combat_app();
    let shooter = spawn_shooter(&mut app, Vec3::ZERO);
    let dummy = spawn_dummy(&mut app, Vec3::new(5.0, 0.0, 5.0), NetworkRole::Authority);

    press_shoot(&mut app, shooter, None);
    step(&mut app, 1);

    assert_eq!(health(&app, dummy), 100.0);
    assert_eq!(stamp(&app, shooter, EventKind::Shot), 1);
    assert_eq!(impact(&app, shooter), None);
}

#[test]
fn test_shooter_killed_before_raycast_fires_nothing() {
    let mut app = create_combat_app();
    let shooter = spawn_shooter(&mut app, Vec3::ZERO);
    let dummy = spawn_dummy(&mut app, Vec3::new(0.0, 0.0, 5.0), NetworkRole::Authority);

    // DamageRequest обрабатывается в Combat set раньше raycast
    press_shoot(&mut app, shooter, None);
    app.world_mut().send_event(DamageRequest {
        target: shooter,
        amount: 1000.0,
        source: None,
    });
    step(&mut app, 1);

    assert!(app.world().get::<Dead>(shooter).is_some());
    assert_eq!(health(&app, dummy), 100.0);
    assert_eq!(impact(&app, shooter), None);
}

#[test]
fn test_non_authority_copy_cannot_shoot() {
    let mut app = create_combat_app();
    let shooter = spawn_shooter(&mut app, Vec3::ZERO);
    app.world_mut().entity_mut(shooter).insert(NetworkRole::Controller);
    let dummy = spawn_dummy(&mut app, Vec3::new(0.0, 0.0, 5.0), NetworkRole::Authority);

    press_shoot(&mut app, shooter, None);
    step(&mut app, 1);

    assert_eq!(stamp(&app, shooter, EventKind::Shot), 0);
    assert_eq!(app.world().get::<RangedWeapon>(shooter).unwrap().cooldown, TickTimer::NotRunning);
    assert_eq!(health(&app, dummy), 100.0);
}
