//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: базовые характеристики (faction, health, player/enemy markers)
//! - movement: позиция, ориентация (yaw), скорость

pub mod actor;
pub mod movement;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;
