//! Combat module (melee, damage, knockback, death)
//!
//! Authority ответственность:
//! - Health / MeleeCombat / RangedWeapon state, TakeDamage, Heal, TryAttack
//! - Delayed damage (windup → overlap → урон), hitscan выстрелы, knockback flight
//! - Death: Dead marker, despawn (враги) / respawn (игроки)
//!
//! Cosmetics здесь НЕ играются: только stamps (`CombatStamps`),
//! которые replay'ит presentation через cursor.

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod systems;
pub mod target;

// Re-export основных типов
pub use components::{
    AttackRejected, Dead, DespawnAfter, Knockback, MeleeCombat, RangedWeapon, Respawning, ShotImpact, ShotTrace,
};
pub use events::{DamageDealt, DamageRequest, EntityDied, HealRequest, KnockbackRequest};
pub use systems::CombatantData;
pub use target::{try_attack, Arsenal, AttackKind, AttackOutcome, CombatTarget, DamageOutcome, Victim};

use crate::collision::Obstacles;
use crate::navigation::Navigation;
use crate::SimulationSet;

/// Combat Plugin
///
/// Порядок выполнения (FixedUpdate, `SimulationSet::Combat`):
/// 1. process_damage_requests: внешние DamageRequest (ловушки, скрипты)
/// 2. process_heal_requests
/// 3. resolve_pending_shots: raycast выстрелов этого тика → урон
/// 4. resolve_pending_damage: windup истёк → overlap → урон
/// 5. process_knockback_requests: выжившим после удара
/// 6. handle_deaths: Dead + DespawnAfter / Respawning
///
/// `despawn_after_timeout` в `SimulationSet::Cleanup`.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<DamageRequest>()
            .add_event::<KnockbackRequest>()
            .add_event::<HealRequest>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>();

        // World collaborators (host может подменить до старта)
        app.init_resource::<Obstacles>().init_resource::<Navigation>();

        app.add_systems(
            FixedUpdate,
            (
                systems::process_damage_requests,
                systems::process_heal_requests,
                systems::resolve_pending_shots,
                systems::resolve_pending_damage,
                systems::process_knockback_requests,
                systems::handle_deaths,
            )
                .chain()
                .in_set(SimulationSet::Combat),
        );

        app.add_systems(
            FixedUpdate,
            systems::despawn_after_timeout.in_set(SimulationSet::Cleanup),
        );
    }
}
