//! Locomotion / authority gate
//!
//! Authority интегрирует движение каждый тик:
//! 1. integrate_knockback: override, вытесняет всё остальное
//! 2. integrate_character_motors: игроки (input → motor)
//! 3. drive_nav_agents: враги (NavAgent velocity)
//!
//! Controller / Observer только читают replicated Position (рендер в presentation).

use bevy::prelude::*;

use crate::combat::components::{Dead, Knockback};
use crate::combat::systems::integrate_knockback;
use crate::components::{Orientation, Position, Velocity};
use crate::error::SimError;
use crate::navigation::{NavAgent, Navigation};
use crate::replication::{require_authority, NetworkRole, NetworkTick};
use crate::SimulationSet;

pub mod motor;

pub use motor::{CharacterMotor, INPUT_DEADZONE};

/// Authority-only запись позиции (телепорт, респавн, snap)
pub fn set_position(
    entity: Entity,
    role: NetworkRole,
    position: &mut Position,
    to: Vec3,
) -> Result<(), SimError> {
    require_authority(role, entity, "set_position")?;
    position.0 = to;
    Ok(())
}

/// System: шаг character motor'ов (Authority-only)
pub fn integrate_character_motors(
    tick: Res<NetworkTick>,
    nav: Res<Navigation>,
    mut bodies: Query<(
        &NetworkRole,
        &mut CharacterMotor,
        &mut Position,
        &mut Velocity,
        &Orientation,
        &Knockback,
        Has<Dead>,
    )>,
) {
    for (role, mut motor, mut position, mut velocity, orientation, knockback, dead) in bodies.iter_mut() {
        if !role.is_authority() || dead || knockback.is_active() {
            continue;
        }

        let (next, next_velocity) = motor.step(position.0, velocity.0, orientation, tick.delta_secs, nav.surface());
        position.0 = next;
        velocity.0 = next_velocity;
    }
}

/// System: NavAgent → velocity → position (Authority-only, враги)
pub fn drive_nav_agents(
    tick: Res<NetworkTick>,
    nav: Res<Navigation>,
    mut agents: Query<
        (&NetworkRole, &mut NavAgent, &mut Position, &mut Velocity, &Knockback, Has<Dead>),
        Without<CharacterMotor>,
    >,
) {
    for (role, mut agent, mut position, mut velocity, knockback, dead) in agents.iter_mut() {
        if !role.is_authority() || dead || knockback.is_active() {
            continue;
        }

        let steer = agent.steer(position.0, tick.delta_secs);
        velocity.0 = steer;
        if steer == Vec3::ZERO {
            continue;
        }

        let next = position.0 + steer * tick.delta_secs;
        match nav.surface().ground_height(next) {
            Some(ground) => position.0 = Vec3::new(next.x, ground, next.z),
            None => {
                // агент уткнулся в край: стоим
                agent.velocity = Vec3::ZERO;
                velocity.0 = Vec3::ZERO;
            }
        }
    }
}

/// Locomotion Plugin
///
/// Все системы в `SimulationSet::Locomotion`, строго по порядку:
/// knockback → motors → nav agents.
pub struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (integrate_knockback, integrate_character_motors, drive_nav_agents)
                .chain()
                .in_set(SimulationSet::Locomotion),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_position_requires_authority() {
        let entity = Entity::from_raw(1);
        let mut position = Position(Vec3::ZERO);

        let err = set_position(entity, NetworkRole::Observer, &mut position, Vec3::ONE).unwrap_err();
        assert!(matches!(err, SimError::AuthorityViolation { operation: "set_position", .. }));
        assert_eq!(position.0, Vec3::ZERO);

        set_position(entity, NetworkRole::Authority, &mut position, Vec3::ONE).unwrap();
        assert_eq!(position.0, Vec3::ONE);
    }
}
