//! Death / lifecycle markers.

use bevy::prelude::*;

use crate::replication::TickTimer;

/// Компонент-маркер: entity мертв (explicit death)
///
/// alive = health > 0 ∧ ¬Dead. Ставится в тот же тик, когда health упал до 0.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Dead;

/// Компонент: деспавн entity когда timer истечёт (враги после смерти)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct DespawnAfter {
    pub timer: TickTimer,
}

/// Компонент: игрок ждёт респавна
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Respawning {
    pub timer: TickTimer,
}
