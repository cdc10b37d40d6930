//! Target acquisition / re-evaluation.

use bevy::prelude::*;

use crate::ai::components::{nearest_candidate, AIBrain, AIConfig, AIState};
use crate::combat::components::{Dead, Knockback};
use crate::components::{Actor, Health, Position};
use crate::error::SimError;
use crate::replication::{NetworkRole, NetworkTick, TickTimer};

/// Горизонтальная дистанция (AI решения игнорируют высоту)
pub fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

type TargetData = (Entity, &'static Actor, &'static Position, &'static Health);

/// Ближайший живой враг в радиусе обнаружения
fn nearest_hostile(
    seeker: Entity,
    actor: &Actor,
    from: Vec3,
    range: f32,
    targets: &Query<TargetData, Without<Dead>>,
) -> Option<(Entity, f32)> {
    nearest_candidate(targets.iter().filter_map(|(candidate, other, position, health)| {
        if candidate == seeker || !actor.is_hostile_to(other) || !health.is_alive() {
            return None;
        }
        let distance = flat_distance(from, position.0);
        (distance <= range).then_some((candidate, distance))
    }))
}

/// Система: AI target acquisition (Authority-only)
///
/// - нет цели → поиск каждый тик (кроме retry cooldown после провала pathing)
/// - есть цель → пересмотр раз в `retarget_interval`, переключение с hysteresis
/// - цель умерла / исчезла → InvalidTargetReference, немедленный повторный поиск
/// - активный knockback: решения заморожены целиком (как и в FSM)
pub fn ai_update_targets(
    tick: Res<NetworkTick>,
    mut ai_query: Query<(
        Entity,
        &NetworkRole,
        &Actor,
        &Position,
        &AIConfig,
        &AIState,
        &mut AIBrain,
        &Knockback,
        Has<Dead>,
    )>,
    targets: Query<TargetData, Without<Dead>>,
) {
    for (entity, role, actor, position, config, state, mut brain, knockback, dead) in ai_query.iter_mut() {
        if !role.is_authority() || dead || state.is_terminal() || knockback.is_active() {
            continue;
        }

        // Weak reference: проверяем что цель ещё жива
        if let Some(target) = brain.target {
            let valid = targets
                .get(target)
                .is_ok_and(|(_, other, _, health)| health.is_alive() && actor.is_hostile_to(other));
            if !valid {
                SimError::InvalidTargetReference { holder: entity, target }.report();
                brain.forget_target();
            }
        }

        match brain.target {
            None => {
                if brain.retry_pending(tick.tick) {
                    continue;
                }
                brain.retry.reset();

                if let Some((found, distance)) = nearest_hostile(entity, actor, position.0, config.detection_range, &targets) {
                    crate::logger::log(&format!(
                        "🎯 AI {:?} acquired target {:?} ({:.1}m)",
                        entity, found, distance
                    ));
                    brain.target = Some(found);
                    brain.retarget = TickTimer::from_seconds(&tick, config.retarget_interval);
                }
            }
            Some(current) => {
                if !brain.retarget.expired_or_not_running(tick.tick) {
                    continue;
                }
                brain.retarget = TickTimer::from_seconds(&tick, config.retarget_interval);

                let Ok((_, _, current_pos, _)) = targets.get(current) else {
                    continue;
                };
                let current_distance = flat_distance(position.0, current_pos.0);

                if let Some((candidate, distance)) = nearest_hostile(entity, actor, position.0, config.detection_range, &targets) {
                    if candidate != current && config.should_switch(current_distance, distance) {
                        crate::logger::log(&format!(
                            "🔄 AI {:?} switched target {:?} → {:?} ({:.1}m → {:.1}m)",
                            entity, current, candidate, current_distance, distance
                        ));
                        brain.target = Some(candidate);
                    }
                }
            }
        }
    }
}
