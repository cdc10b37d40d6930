//! Ошибки симуляции
//!
//! Ни одна из них не фатальна: вызывающая система логирует через `report()`
//! и продолжает тик (деградация поведения вместо краша сессии).

use bevy::prelude::*;
use thiserror::Error;

use crate::logger::{self, LogLevel};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Запись в authoritative поле с не-Authority роли (нормально во время смены ролей)
    #[error("authority violation: {operation} on {entity:?} attempted with role {role:?}")]
    AuthorityViolation {
        entity: Entity,
        operation: &'static str,
        role: crate::replication::NetworkRole,
    },

    /// Нет walkable точки в радиусе поиска
    #[error("navigation failure: no walkable point within {radius:.1}m of {near:?}")]
    NavigationFailure { near: Vec3, radius: f32 },

    /// Цель умерла или была удалена посреди решения AI
    #[error("invalid target reference {target:?} held by {holder:?}")]
    InvalidTargetReference { holder: Entity, target: Entity },

    /// У заспавненной сущности нет обязательных данных (combat data asset и т.п.)
    #[error("missing collaborator for {owner}: {what}")]
    MissingCollaborator { owner: String, what: &'static str },
}

impl SimError {
    pub fn level(&self) -> LogLevel {
        match self {
            SimError::AuthorityViolation { .. } => LogLevel::Debug,
            SimError::InvalidTargetReference { .. } => LogLevel::Debug,
            SimError::NavigationFailure { .. } => LogLevel::Warning,
            SimError::MissingCollaborator { .. } => LogLevel::Warning,
        }
    }

    /// Логирует ошибку. MissingCollaborator: только один раз на owner+what.
    pub fn report(&self) {
        match self {
            SimError::MissingCollaborator { owner, what } => {
                let key = format!("missing:{}:{}", owner, what);
                logger::log_once(&key, self.level(), &format!("⚠️ {}", self));
            }
            _ => logger::log_with_level(self.level(), &format!("⚠️ {}", self)),
        }
    }
}

/// Ошибки загрузки конфигурации (RON data assets)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("invalid config value: {0}")]
    Invalid(String),
}
