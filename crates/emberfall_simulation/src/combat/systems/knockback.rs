//! Knockback systems.

use bevy::prelude::*;

use crate::collision::{CollisionVolume, Obstacles};
use crate::combat::components::{Dead, Knockback};
use crate::combat::events::KnockbackRequest;
use crate::components::{Health, Position, Velocity};
use crate::config::SimulationConfig;
use crate::navigation::{NavAgent, Navigation};
use crate::replication::{require_authority, NetworkRole, NetworkTick};

/// System: KnockbackRequest → ApplyKnockback (Authority-only)
///
/// Мёртвых не отбрасываем. Pathing выключается до конца knockback.
pub fn process_knockback_requests(
    tick: Res<NetworkTick>,
    config: Res<SimulationConfig>,
    mut requests: EventReader<KnockbackRequest>,
    mut bodies: Query<(
        Entity,
        &NetworkRole,
        &Position,
        &Health,
        Has<Dead>,
        &mut Knockback,
        Option<&mut NavAgent>,
    )>,
) {
    for request in requests.read() {
        let Ok((entity, role, position, health, dead, mut knockback, agent)) = bodies.get_mut(request.target) else {
            continue;
        };
        if let Err(err) = require_authority(*role, entity, "apply_knockback") {
            err.report();
            continue;
        }
        if dead || !health.is_alive() {
            continue;
        }

        knockback.apply(request.impulse, &config.knockback, &tick, position.0);
        if let Some(mut agent) = agent {
            agent.disable();
        }

        crate::logger::log(&format!(
            "🌀 Knockback applied to {:?}: velocity {:?}",
            entity, knockback.velocity
        ));
    }
}

/// System: полёт knockback (Locomotion, перед motor / nav agents)
pub fn integrate_knockback(
    tick: Res<NetworkTick>,
    config: Res<SimulationConfig>,
    nav: Res<Navigation>,
    obstacles: Res<Obstacles>,
    mut bodies: Query<(
        Entity,
        &NetworkRole,
        &mut Position,
        &mut Velocity,
        &mut Knockback,
        Option<&mut NavAgent>,
        Option<&CollisionVolume>,
        Has<Dead>,
    )>,
) {
    for (entity, role, mut position, mut velocity, mut knockback, agent, volume, dead) in bodies.iter_mut() {
        if !role.is_authority() || !knockback.is_active() {
            continue;
        }

        if knockback.expired(tick.tick) {
            position.0 = knockback.finish(position.0, &config.knockback, nav.surface());
            velocity.0 = Vec3::ZERO;
            if let Some(mut agent) = agent {
                if !dead {
                    agent.enable();
                }
            }
            crate::logger::log(&format!("🌀 Knockback finished for {:?} at {:?}", entity, position.0));
            continue;
        }

        let radius = volume.map_or(0.5, |v| v.radius);
        position.0 = knockback.integrate(
            position.0,
            tick.delta_secs,
            &config.knockback,
            radius,
            &obstacles,
            nav.surface(),
        );
        velocity.0 = knockback.velocity;
    }
}
