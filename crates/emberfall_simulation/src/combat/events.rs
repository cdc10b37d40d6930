//! Combat events (ECS-internal, не реплицируются)
//!
//! Входящие запросы от коллабораторов (ловушки, скрипты, host tools) и
//! исходящие уведомления для них. Cosmetics по этим событиям НЕ играются:
//! только через stamps + cursor replay.

use bevy::prelude::*;

use super::target::DamageOutcome;

/// Запрос: нанести урон (Authority-only, иначе AuthorityViolation)
#[derive(Event, Debug, Clone)]
pub struct DamageRequest {
    pub target: Entity,
    pub amount: f32,
    pub source: Option<Entity>,
}

/// Запрос: отбросить entity
#[derive(Event, Debug, Clone)]
pub struct KnockbackRequest {
    pub target: Entity,
    pub impulse: Vec3,
}

/// Запрос: вылечить entity (clamp к max)
#[derive(Event, Debug, Clone)]
pub struct HealRequest {
    pub target: Entity,
    pub amount: f32,
}

/// Урон применён (любой исход кроме Ignored)
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Option<Entity>,
    pub target: Entity,
    pub outcome: DamageOutcome,
}

/// Entity умер (health достиг 0)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}
