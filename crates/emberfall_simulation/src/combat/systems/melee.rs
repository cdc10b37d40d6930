//! Melee combat systems (delayed damage resolution).

use bevy::prelude::*;

use crate::collision::{overlap_sphere, CollisionVolume};
use crate::combat::events::{DamageDealt, EntityDied, KnockbackRequest};
use crate::combat::target::{CombatTarget, DamageOutcome, Victim};
use crate::components::Position;
use crate::config::MeleeData;
use crate::replication::{EventKind, NetworkTick};

use super::damage::emit_damage_events;
use super::CombatantData;

/// Удар, чей windup истёк на этом тике
struct ResolvedSwing {
    attacker: Entity,
    origin: Vec3,
    point: Vec3,
    stats: MeleeData,
}

/// Снять pending с атакующего и собрать удар
///
/// None: windup не истёк, его прервали раньше на этом тике, или атакующий уже мёртв.
fn take_due_swing(combatants: &mut Query<CombatantData>, attacker: Entity, tick: u64) -> Option<ResolvedSwing> {
    let (entity, role, position, orientation, health, combat, _, dead) = combatants.get_mut(attacker).ok()?;
    let mut combat = combat?;
    if !role.is_authority() || !combat.damage_due(tick) {
        return None;
    }
    combat.finish_windup();

    if dead || !health.is_alive() {
        crate::logger::log(&format!("🪦 Swing of {:?} dropped: attacker died during windup", entity));
        return None;
    }
    Some(ResolvedSwing {
        attacker: entity,
        origin: position.0,
        point: combat.attack_point(position.0, orientation),
        stats: combat.stats.clone(),
    })
}

/// System: разрешить pending атаки (Authority-only)
///
/// `PendingDamage ∧ DamageDelayTimer.Expired` → overlap в attack point →
/// урон всем живым жертвам кроме себя → Landed stamp если хоть кого-то задели.
/// Knockback: только выжившим.
///
/// Удары одного тика разрешаются по одному в порядке Entity: удар, который убил
/// или прервал другого атакующего, отменяет его windup до того, как тот сработает.
pub fn resolve_pending_damage(
    tick: Res<NetworkTick>,
    mut combatants: Query<CombatantData>,
    volumes: Query<(Entity, &Position, &CollisionVolume)>,
    mut dealt: EventWriter<DamageDealt>,
    mut died: EventWriter<EntityDied>,
    mut knockbacks: EventWriter<KnockbackRequest>,
) {
    let mut due: Vec<Entity> = combatants
        .iter()
        .filter(|(_, role, _, _, _, combat, _, _)| {
            role.is_authority() && combat.as_ref().is_some_and(|c| c.damage_due(tick.tick))
        })
        .map(|(entity, ..)| entity)
        .collect();
    due.sort();

    for attacker in due {
        // Перепроверка: предыдущий удар этого тика мог прервать или убить атакующего
        let Some(swing) = take_due_swing(&mut combatants, attacker, tick.tick) else {
            continue;
        };

        let targets = overlap_sphere(
            swing.point,
            swing.stats.radius,
            swing.stats.target_mask,
            volumes
                .iter()
                .filter(|(entity, _, _)| *entity != swing.attacker)
                .map(|(entity, position, volume)| (entity, position.0, volume)),
        );

        let mut landed = false;
        for target in targets {
            let Ok((entity, role, position, _, mut health, mut combat, mut stamps, dead)) =
                combatants.get_mut(target)
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
            if !victim.is_alive() {
                continue;
            }

            let outcome = match victim.take_damage(swing.stats.damage, &tick) {
                Ok(outcome) => outcome,
                Err(err) => {
                    err.report();
                    continue;
                }
            };
            landed |= outcome.connected();

            if matches!(outcome, DamageOutcome::Damaged { .. }) && swing.stats.knockback_force > 0.0 {
                knockbacks.write(KnockbackRequest {
                    target: entity,
                    impulse: knockback_impulse(swing.origin, victim.position(), &swing.stats),
                });
            }

            emit_damage_events(Some(swing.attacker), entity, outcome, &mut dealt, &mut died);
        }

        if landed {
            if let Ok((_, _, _, _, _, _, mut stamps, _)) = combatants.get_mut(swing.attacker) {
                stamps.bump(EventKind::Landed, tick.tick);
            }
        } else {
            crate::logger::log(&format!("💨 Swing of {:?} hit nothing", swing.attacker));
        }
    }
}

/// Импульс вдоль attacker → victim (горизонтально) + подъём
pub fn knockback_impulse(attacker: Vec3, victim: Vec3, stats: &MeleeData) -> Vec3 {
    let flat = Vec3::new(victim.x - attacker.x, 0.0, victim.z - attacker.z);
    let direction = if flat.length_squared() > 1e-6 {
        flat.normalize()
    } else {
        Vec3::Z
    };
    direction * stats.knockback_force + Vec3::Y * stats.knockback_lift
}
