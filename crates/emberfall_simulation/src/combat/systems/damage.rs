//! Damage, heal and death systems.

use bevy::prelude::*;

use crate::collision::CollisionVolume;
use crate::combat::components::{Dead, DespawnAfter, Knockback, Respawning};
use crate::combat::events::{DamageDealt, DamageRequest, EntityDied, HealRequest};
use crate::combat::target::{CombatTarget, DamageOutcome, Victim};
use crate::components::{Enemy, Player, Position, Velocity};
use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::navigation::{NavAgent, Navigation};
use crate::replication::{NetworkRole, NetworkTick, TickTimer};

use super::CombatantData;

/// Разослать события по исходу TakeDamage
pub(crate) fn emit_damage_events(
    attacker: Option<Entity>,
    target: Entity,
    outcome: DamageOutcome,
    dealt: &mut EventWriter<DamageDealt>,
    died: &mut EventWriter<EntityDied>,
) {
    if !outcome.connected() {
        return;
    }

    dealt.write(DamageDealt {
        attacker,
        target,
        outcome,
    });

    match outcome {
        DamageOutcome::Killed { dealt } => {
            crate::logger::log_info(&format!(
                "💀 Entity {:?} killed ({:.1} damage, killer: {:?})",
                target, dealt, attacker
            ));
            died.write(EntityDied {
                entity: target,
                killer: attacker,
            });
        }
        DamageOutcome::Damaged { dealt, remaining } => {
            crate::logger::log(&format!(
                "💥 Entity {:?} took {:.1} damage ({:.1} HP left)",
                target, dealt, remaining
            ));
        }
        DamageOutcome::Blocked => {
            crate::logger::log(&format!("🛡️ Entity {:?} blocked the hit", target));
        }
        DamageOutcome::Ignored => {}
    }
}

/// System: DamageRequest → TakeDamage
pub fn process_damage_requests(
    tick: Res<NetworkTick>,
    mut requests: EventReader<DamageRequest>,
    mut combatants: Query<CombatantData>,
    mut dealt: EventWriter<DamageDealt>,
    mut died: EventWriter<EntityDied>,
) {
    for request in requests.read() {
        let Ok((entity, role, position, _, mut health, mut combat, mut stamps, dead)) =
            combatants.get_mut(request.target)
        else {
            SimError::InvalidTargetReference {
                holder: request.source.unwrap_or(Entity::PLACEHOLDER),
                target: request.target,
            }
            .report();
            continue;
        };

        let mut victim = Victim {
            entity,
            role: *role,
            position: position.0,
            dead,
            health: &mut health,
            combat: combat.as_deref_mut(),
            stamps: &mut stamps,
        };

        match victim.take_damage(request.amount, &tick) {
            Ok(outcome) => emit_damage_events(request.source, entity, outcome, &mut dealt, &mut died),
            Err(err) => err.report(),
        }
    }
}

/// System: HealRequest → Heal
pub fn process_heal_requests(mut requests: EventReader<HealRequest>, mut combatants: Query<CombatantData>) {
    for request in requests.read() {
        let Ok((entity, role, position, _, mut health, mut combat, mut stamps, dead)) =
            combatants.get_mut(request.target)
        else {
            continue;
        };

        let mut victim = Victim {
            entity,
            role: *role,
            position: position.0,
            dead,
            health: &mut health,
            combat: combat.as_deref_mut(),
            stamps: &mut stamps,
        };

        match victim.heal(request.amount) {
            Ok(healed) if healed > 0.0 => {
                crate::logger::log(&format!("💚 Entity {:?} healed {:.1}", entity, healed));
            }
            Ok(_) => {}
            Err(err) => err.report(),
        }
    }
}

/// System: обработка смерти (EntityDied → Dead)
///
/// Останавливает движение и pathing, выключает hit volume, гасит knockback.
/// Враги → DespawnAfter, игроки → Respawning.
pub fn handle_deaths(
    mut commands: Commands,
    tick: Res<NetworkTick>,
    config: Res<SimulationConfig>,
    nav: Res<Navigation>,
    mut died: EventReader<EntityDied>,
    mut bodies: Query<(
        &NetworkRole,
        &mut Position,
        &mut Velocity,
        Option<&mut NavAgent>,
        Option<&mut CollisionVolume>,
        Option<&mut Knockback>,
        Has<Player>,
        Has<Enemy>,
    )>,
) {
    for event in died.read() {
        let Ok((role, mut position, mut velocity, agent, volume, knockback, is_player, is_enemy)) =
            bodies.get_mut(event.entity)
        else {
            continue;
        };
        if !role.is_authority() {
            continue;
        }

        velocity.0 = Vec3::ZERO;
        if let Some(mut agent) = agent {
            agent.disable();
        }
        if let Some(mut volume) = volume {
            volume.enabled = false;
        }
        if let Some(mut knockback) = knockback {
            if knockback.is_active() {
                position.0 = knockback.finish(position.0, &config.knockback, nav.surface());
            }
        }

        let mut entity_commands = commands.entity(event.entity);
        entity_commands.insert(Dead);

        if is_enemy {
            entity_commands.insert(DespawnAfter {
                timer: TickTimer::from_seconds(&tick, config.lifecycle.enemy_despawn_delay),
            });
        }
        if is_player {
            entity_commands.insert(Respawning {
                timer: TickTimer::from_seconds(&tick, config.lifecycle.respawn_delay),
            });
            crate::logger::log_info(&format!(
                "⏳ Player {:?} will respawn in {:.1}s",
                event.entity, config.lifecycle.respawn_delay
            ));
        }
    }
}

/// System: деспавн entities с истёкшим DespawnAfter
pub fn despawn_after_timeout(
    mut commands: Commands,
    tick: Res<NetworkTick>,
    query: Query<(Entity, &NetworkRole, &DespawnAfter)>,
) {
    for (entity, role, despawn_after) in query.iter() {
        if role.is_authority() && despawn_after.timer.expired(tick.tick) {
            crate::logger::log(&format!("⚰️ Despawning entity {:?} (timeout)", entity));
            commands.entity(entity).despawn();
        }
    }
}
