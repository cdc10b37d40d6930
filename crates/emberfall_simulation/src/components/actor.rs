//! Базовые компоненты акторов: Actor, Health, Player, Enemy

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::components::Knockback;
use crate::components::{Orientation, Position, Velocity};
use crate::replication::{CombatStamps, CosmeticCursors, NetworkRole};

/// Фракция игроков
pub const FACTION_PLAYERS: u64 = 1;
/// Фракция врагов
pub const FACTION_ENEMIES: u64 = 2;

/// Актор (игрок или враг): базовый компонент для живых существ
///
/// Автоматически добавляет Health, роль, stamps и кинематику через Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health, NetworkRole, CombatStamps, CosmeticCursors, Position, Orientation, Velocity, Knockback)]
pub struct Actor {
    /// Stable ID фракции (враждебность = разные фракции)
    pub faction_id: u64,
}

impl Actor {
    pub fn is_hostile_to(&self, other: &Actor) -> bool {
        self.faction_id != other.faction_id
    }
}

/// Здоровье актора (replicated)
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Вычесть урон (пол = 0). Возвращает фактически снятое количество.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current - amount.max(0.0)).max(0.0);
        before - self.current
    }

    /// Лечение (потолок = max). Возвращает фактически добавленное количество.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current + amount.max(0.0)).min(self.max);
        self.current - before
    }

    pub fn restore_full(&mut self) {
        self.current = self.max;
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }
}

/// Идентификатор peer (игрока в сессии)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize, Deserialize)]
pub struct PeerId(pub u64);

/// Игрок, принадлежащий peer
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Player {
    pub owner: PeerId,
    /// Точка (ре)спавна
    pub spawn_point: Vec3,
}

/// Враг, созданный population controller
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Enemy {
    pub archetype: String,
    pub elite: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage_floors_at_zero() {
        let mut health = Health::new(100.0);
        assert_eq!(health.take_damage(30.0), 30.0);
        assert_eq!(health.current, 70.0);
        assert!(health.is_alive());

        assert_eq!(health.take_damage(100.0), 70.0);
        assert_eq!(health.current, 0.0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_health_heal_clamped_to_max() {
        let mut health = Health::new(100.0);
        health.take_damage(50.0);

        assert_eq!(health.heal(30.0), 30.0);
        assert_eq!(health.current, 80.0);

        assert_eq!(health.heal(100.0), 20.0);
        assert_eq!(health.current, 100.0);
    }

    #[test]
    fn test_negative_amounts_are_ignored() {
        let mut health = Health::new(50.0);
        health.take_damage(-10.0);
        assert_eq!(health.current, 50.0);
        health.take_damage(20.0);
        health.heal(-5.0);
        assert_eq!(health.current, 30.0);
    }

    #[test]
    fn test_hostility_by_faction() {
        let player = Actor { faction_id: FACTION_PLAYERS };
        let enemy = Actor { faction_id: FACTION_ENEMIES };
        assert!(player.is_hostile_to(&enemy));
        assert!(!player.is_hostile_to(&player.clone()));
    }
}
