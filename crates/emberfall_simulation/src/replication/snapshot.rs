//! Replicated state snapshot ("last value wins")
//!
//! Substrate внешний; snapshot: его заменитель для headless прогонов и тестов:
//! Authority снимает replicated поля (`capture_snapshot`), наблюдающий мир
//! перезаписывает своё зеркало (`apply_snapshot`). Промежуточные значения
//! теряются: stamps + cursor к этому устойчивы.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::AIState;
use crate::combat::components::{Dead, Knockback, ShotImpact, ShotTrace};
use crate::components::{Actor, Enemy, Health, Orientation, PeerId, Player, Position, Velocity};
use crate::input::PlayerInput;

use super::{CombatStamps, CosmeticCursors, InputAuthority, NetId, NetworkRole, NetworkTick};

/// Чем является replicated entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplicatedKind {
    Player { owner: PeerId, spawn_point: [f32; 3] },
    Enemy { archetype: String, elite: bool },
}

/// Replicated поля одной entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicatedEntity {
    pub id: NetId,
    pub kind: ReplicatedKind,
    pub faction_id: u64,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub orientation: Orientation,
    pub health: Health,
    pub dead: bool,
    pub stamps: CombatStamps,
    pub ai_state: Option<AIState>,
    pub knockback: bool,
    /// Точка попадания последнего выстрела (только у игроков)
    #[serde(default)]
    pub shot_impact: Option<ReplicatedImpact>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplicatedImpact {
    pub point: [f32; 3],
    pub normal: [f32; 3],
}

impl From<ShotImpact> for ReplicatedImpact {
    fn from(impact: ShotImpact) -> Self {
        Self {
            point: impact.point.to_array(),
            normal: impact.normal.to_array(),
        }
    }
}

impl From<ReplicatedImpact> for ShotImpact {
    fn from(impact: ReplicatedImpact) -> Self {
        Self {
            point: Vec3::from_array(impact.point),
            normal: Vec3::from_array(impact.normal),
        }
    }
}

/// Снимок всех authoritative entities на тике
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplicatedState {
    pub tick: u64,
    pub entities: Vec<ReplicatedEntity>,
}

impl ReplicatedState {
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::to_string(self)
    }

    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    pub fn get(&self, id: NetId) -> Option<&ReplicatedEntity> {
        self.entities.iter().find(|e| e.id == id)
    }
}

/// Снять replicated поля всех entities, где этот peer: Authority (сортировка по NetId)
pub fn capture_snapshot(world: &mut World) -> ReplicatedState {
    let tick = world.get_resource::<NetworkTick>().map_or(0, |t| t.tick);

    let mut query = world.query::<(
        &NetId,
        &NetworkRole,
        &Actor,
        Option<&Player>,
        Option<&Enemy>,
        &Position,
        &Velocity,
        &Orientation,
        &Health,
        Has<Dead>,
        &CombatStamps,
        Option<&AIState>,
        Option<&Knockback>,
        Option<&ShotTrace>,
    )>();

    let mut entities: Vec<ReplicatedEntity> = query
        .iter(world)
        .filter(|(_, role, ..)| role.is_authority())
        .filter_map(
            |(
                id,
                _,
                actor,
                player,
                enemy,
                position,
                velocity,
                orientation,
                health,
                dead,
                stamps,
                ai_state,
                knockback,
                trace,
            )| {
                let kind = match (player, enemy) {
                    (Some(player), _) => ReplicatedKind::Player {
                        owner: player.owner,
                        spawn_point: player.spawn_point.to_array(),
                    },
                    (None, Some(enemy)) => ReplicatedKind::Enemy {
                        archetype: enemy.archetype.clone(),
                        elite: enemy.elite,
                    },
                    (None, None) => return None,
                };
                Some(ReplicatedEntity {
                    id: *id,
                    kind,
                    faction_id: actor.faction_id,
                    position: position.0.to_array(),
                    velocity: velocity.0.to_array(),
                    orientation: *orientation,
                    health: *health,
                    dead,
                    stamps: *stamps,
                    ai_state: ai_state.copied(),
                    knockback: knockback.is_some_and(|k| k.is_active()),
                    shot_impact: trace.and_then(|t| t.impact).map(ReplicatedImpact::from),
                })
            },
        )
        .collect();

    entities.sort_by_key(|e| e.id);
    ReplicatedState { tick, entities }
}

/// Применить snapshot к наблюдающему миру
///
/// Новые entities спавнятся как Observer (или Controller + InputAuthority для
/// игрока `local_peer`); курсоры новых entities сдвигаются на текущие stamps
/// (история до подключения не проигрывается). Пропавшие из snapshot: удаляются.
pub fn apply_snapshot(world: &mut World, state: &ReplicatedState, local_peer: Option<PeerId>) {
    let mut known: HashMap<NetId, (Entity, NetworkRole)> = world
        .query::<(Entity, &NetId, &NetworkRole)>()
        .iter(world)
        .map(|(entity, id, role)| (*id, (entity, *role)))
        .collect();

    for replicated in &state.entities {
        let local = matches!(
            replicated.kind,
            ReplicatedKind::Player { owner, .. } if Some(owner) == local_peer
        );
        let role = if local {
            NetworkRole::Controller
        } else {
            NetworkRole::Observer
        };

        let mirrored = (
            role,
            Position(Vec3::from_array(replicated.position)),
            Velocity(Vec3::from_array(replicated.velocity)),
            replicated.orientation,
            replicated.health,
            replicated.stamps,
            Knockback {
                active: replicated.knockback,
                ..Knockback::default()
            },
        );

        let entity = match known.remove(&replicated.id) {
            Some((_, existing_role)) if existing_role.is_authority() => {
                crate::logger::log_warning(&format!(
                    "⚠️ Snapshot tried to overwrite authoritative {:?}, skipped",
                    replicated.id
                ));
                continue;
            }
            Some((entity, _)) => {
                world.entity_mut(entity).insert(mirrored);
                entity
            }
            None => {
                let mut cursors = CosmeticCursors::default();
                cursors.sync_to(&replicated.stamps);

                let mut spawned = world.spawn((
                    Actor {
                        faction_id: replicated.faction_id,
                    },
                    replicated.id,
                    cursors,
                    mirrored,
                ));
                match &replicated.kind {
                    ReplicatedKind::Player { owner, spawn_point } => {
                        spawned.insert(Player {
                            owner: *owner,
                            spawn_point: Vec3::from_array(*spawn_point),
                        });
                    }
                    ReplicatedKind::Enemy { archetype, elite } => {
                        spawned.insert(Enemy {
                            archetype: archetype.clone(),
                            elite: *elite,
                        });
                    }
                }
                if local {
                    spawned.insert((InputAuthority, PlayerInput::default()));
                }
                crate::logger::log(&format!(
                    "📥 Mirrored {:?} as {:?} ({:?})",
                    replicated.id,
                    spawned.id(),
                    role
                ));
                spawned.id()
            }
        };

        let mut entity_mut = world.entity_mut(entity);
        if let Some(ai_state) = replicated.ai_state {
            entity_mut.insert(ai_state);
        }
        if matches!(replicated.kind, ReplicatedKind::Player { .. }) {
            entity_mut.insert(ShotTrace {
                impact: replicated.shot_impact.map(ShotImpact::from),
            });
        }
        if replicated.dead {
            entity_mut.insert(Dead);
        } else {
            entity_mut.remove::<Dead>();
        }
    }

    // Всё, что осталось в known и не Authority: исчезло на authority
    for (id, (entity, role)) in known {
        if role.is_authority() {
            continue;
        }
        crate::logger::log(&format!("📤 {:?} left replication, despawning {:?}", id, entity));
        world.despawn(entity);
    }

    if let Some(mut tick) = world.get_resource_mut::<NetworkTick>() {
        tick.tick = state.tick;
    }
}
