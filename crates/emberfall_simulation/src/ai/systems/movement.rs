//! AI movement systems.

use bevy::prelude::*;

use crate::ai::components::{AIBrain, AIConfig, AIState};
use crate::combat::components::{Dead, Knockback};
use crate::components::{Orientation, Position};
use crate::error::SimError;
use crate::navigation::{NavAgent, Navigation};
use crate::replication::{NetworkRole, NetworkTick, TickTimer};

/// Скорость, ниже которой не разворачиваемся по движению
const FACE_MOTION_MIN_SPEED: f32 = 0.1;

/// Система: AI movement from state (Authority-only)
///
/// Chase: каждый тик destination = navigation sample рядом с целью. Sample
/// расширяет радиус (x2, `destination_search_attempts` раз); только когда и это
/// не помогло → Idle + retry cooldown, цель сбрасывается.
/// Ориентация следует за направлением движения с фиксированной угловой скоростью.
pub fn ai_movement_from_state(
    tick: Res<NetworkTick>,
    nav: Res<Navigation>,
    mut ai_query: Query<(
        Entity,
        &NetworkRole,
        &mut AIState,
        &mut AIBrain,
        &AIConfig,
        &Position,
        &mut Orientation,
        &mut NavAgent,
        &Knockback,
        Has<Dead>,
    )>,
    targets: Query<&Position>,
) {
    for (entity, role, mut state, mut brain, config, position, mut orientation, mut agent, knockback, dead) in
        ai_query.iter_mut()
    {
        if !role.is_authority() || dead || state.is_terminal() || knockback.is_active() {
            continue;
        }

        if *state == AIState::Chase {
            let target_pos = brain.target.and_then(|t| targets.get(t).ok()).map(|p| p.0);
            if let Some(target_pos) = target_pos {
                let routed = nav
                    .sample_widening(
                        target_pos,
                        config.destination_sample_radius,
                        config.destination_search_attempts,
                    )
                    .and_then(|point| {
                        if agent.set_destination(nav.surface(), position.0, point) {
                            Ok(point)
                        } else {
                            Err(SimError::NavigationFailure {
                                near: point,
                                radius: config.destination_sample_radius,
                            })
                        }
                    });

                if let Err(err) = routed {
                    err.report();
                    crate::logger::log(&format!(
                        "🧠 AI {:?} Chase → Idle (no path, retry in {:.1}s)",
                        entity, config.idle_retry_cooldown
                    ));
                    *state = AIState::Idle;
                    brain.forget_target();
                    brain.retry = TickTimer::from_seconds(&tick, config.idle_retry_cooldown);
                    agent.reset_path();
                }
            }
        }

        // Attack разворачивает fsm (к цели); здесь: по движению
        if *state == AIState::Chase {
            let motion = Vec3::new(agent.velocity.x, 0.0, agent.velocity.z);
            if motion.length() > FACE_MOTION_MIN_SPEED {
                if let Some(facing) = Orientation::looking_along(motion) {
                    orientation.rotate_towards(facing.yaw, config.max_turn(tick.delta_secs));
                }
            }
        }
    }
}
