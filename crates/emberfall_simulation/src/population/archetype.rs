//! Enemy archetypes + enemy spawn bundle.

use bevy::prelude::*;

use crate::ai::{AIBrain, AIConfig, AIState};
use crate::collision::{layers, CollisionVolume};
use crate::combat::components::MeleeCombat;
use crate::components::{Actor, Enemy, Health, Orientation, Position, FACTION_ENEMIES};
use crate::config::{ArchetypeData, EnemyData};
use crate::error::SimError;
use crate::navigation::NavAgent;
use crate::replication::{NetId, NetworkRole};

/// Тип врага, доступный спавнеру
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyArchetype {
    name: String,
    elite: bool,
    data: Option<EnemyData>,
}

impl From<&ArchetypeData> for EnemyArchetype {
    fn from(data: &ArchetypeData) -> Self {
        Self {
            name: data.name.clone(),
            elite: data.elite,
            data: data.data.clone(),
        }
    }
}

impl EnemyArchetype {
    pub fn new(name: impl Into<String>, elite: bool, data: Option<EnemyData>) -> Self {
        Self {
            name: name.into(),
            elite,
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_elite(&self) -> bool {
        self.elite
    }

    /// Combat data asset. Не назначен → MissingCollaborator (лог один раз) + default.
    pub fn resolve_data(&self) -> EnemyData {
        match &self.data {
            Some(data) => data.clone(),
            None => {
                SimError::MissingCollaborator {
                    owner: format!("archetype '{}'", self.name),
                    what: "enemy data asset",
                }
                .report();
                EnemyData::default()
            }
        }
    }

    /// Bundle врага (Authority-side)
    pub fn bundle(&self, id: NetId, position: Vec3, ai: &AIConfig) -> impl Bundle {
        let data = self.resolve_data();
        let ai_config = AIConfig {
            attack_range: data.attack_range,
            rotation_speed: data.rotation_speed,
            ..ai.clone()
        };

        (
            (
                Actor {
                    faction_id: FACTION_ENEMIES,
                },
                Enemy {
                    archetype: self.name.clone(),
                    elite: self.elite,
                },
                id,
                NetworkRole::Authority,
                Health::new(data.max_health),
                Position(position),
                Orientation::default(),
            ),
            (
                MeleeCombat::new(data.melee_data()),
                NavAgent {
                    speed: data.movement_speed,
                    acceleration: data.acceleration,
                    stopping_distance: data.stopping_distance,
                    ..NavAgent::default()
                },
                CollisionVolume::on_layer(layers::ENEMIES),
                AIState::Idle,
                AIBrain::default(),
                ai_config,
            ),
        )
    }
}
