//! AI decision-making module
//!
//! Простая FSM для enemy AI: Idle / Chase / Attack / Dead.
//! Решения принимает только Authority; остальные peers видят replicated `AIState`.

use bevy::prelude::*;

pub mod components;
pub mod systems;

// Re-export основных типов
pub use components::{nearest_candidate, AIBrain, AIConfig, AIState};

use crate::SimulationSet;

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate (`SimulationSet::Ai`, после Combat).
/// Порядок выполнения:
/// 1. ai_update_targets: поиск / пересмотр / валидация цели
/// 2. ai_fsm_transitions: обновление FSM state + TryAttack
/// 3. ai_movement_from_state: state → NavAgent destination
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                systems::ai_update_targets,
                systems::ai_fsm_transitions,
                systems::ai_movement_from_state,
            )
                .chain() // Последовательное выполнение для детерминизма
                .in_set(SimulationSet::Ai),
        );
    }
}
