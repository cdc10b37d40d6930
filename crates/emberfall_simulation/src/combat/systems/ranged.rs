//! Hitscan shot resolution.

use bevy::prelude::*;

use crate::collision::{raycast, CollisionVolume, Obstacles};
use crate::combat::components::{RangedWeapon, ShotImpact, ShotTrace};
use crate::combat::events::{DamageDealt, EntityDied};
use crate::combat::target::{CombatTarget, Victim};
use crate::components::{Orientation, Position};
use crate::replication::{NetworkRole, NetworkTick};

use super::damage::emit_damage_events;
use super::CombatantData;

/// System: raycast выстрелов, принятых на этом тике (Authority-only)
///
/// Луч из muzzle к aim point (или вдоль forward), первое живое попадание по маске.
/// Попали в актора → TakeDamage(bullet damage). Точка попадания (актор или стена)
/// пишется в `ShotTrace`. Выстрелы одного тика по одному в порядке Entity:
/// убитый раньше стрелок не стреляет.
pub fn resolve_pending_shots(
    tick: Res<NetworkTick>,
    obstacles: Res<Obstacles>,
    mut shooters: Query<(Entity, &NetworkRole, &Position, &Orientation, &mut RangedWeapon, &mut ShotTrace)>,
    mut combatants: Query<CombatantData>,
    volumes: Query<(Entity, &Position, &CollisionVolume)>,
    mut dealt: EventWriter<DamageDealt>,
    mut died: EventWriter<EntityDied>,
) {
    let mut pending: Vec<Entity> = shooters
        .iter()
        .filter(|(_, role, _, _, weapon, _)| role.is_authority() && weapon.pending.is_some())
        .map(|(entity, ..)| entity)
        .collect();
    pending.sort();

    for shooter in pending {
        let Ok((_, _, position, orientation, mut weapon, mut trace)) = shooters.get_mut(shooter) else {
            continue;
        };
        let Some(shot) = weapon.take_pending() else {
            continue;
        };

        let alive = combatants
            .get(shooter)
            .is_ok_and(|(_, _, _, _, health, _, _, dead)| health.is_alive() && !dead);
        if !alive {
            crate::logger::log(&format!("🪦 Shot of {:?} dropped: shooter died this tick", shooter));
            trace.impact = None;
            continue;
        }

        let muzzle = weapon.muzzle(position.0);
        let direction = shot.direction(muzzle, orientation);
        let hit = raycast(
            muzzle,
            direction,
            weapon.stats.max_range,
            weapon.stats.target_mask,
            // Убитые на этом тике ещё с включённым volume: луч проходит насквозь
            volumes
                .iter()
                .filter(|(entity, _, _)| *entity != shooter)
                .filter(|(entity, _, _)| {
                    combatants
                        .get(*entity)
                        .map_or(true, |(_, _, _, _, health, _, _, dead)| health.is_alive() && !dead)
                })
                .map(|(entity, position, volume)| (entity, position.0, volume)),
            &obstacles,
        );
        let damage = weapon.stats.damage;

        trace.impact = hit.map(|hit| ShotImpact {
            point: hit.point,
            normal: hit.normal,
        });

        let Some(target) = hit.and_then(|hit| hit.entity) else {
            crate::logger::log(&format!("💨 Shot of {:?} hit no actor", shooter));
            continue;
        };
        let Ok((entity, role, target_pos, _, mut health, mut combat, mut stamps, dead)) = combatants.get_mut(target)
        else {
            continue;
        };

        let mut victim = Victim {
            entity,
            role: *role,
            position: target_pos.0,
            dead,
            health: &mut health,
            combat: combat.as_deref_mut(),
            stamps: &mut stamps,
        };
        match victim.take_damage(damage, &tick) {
            Ok(outcome) => emit_damage_events(Some(shooter), entity, outcome, &mut dealt, &mut died),
            Err(err) => err.report(),
        }
    }
}
