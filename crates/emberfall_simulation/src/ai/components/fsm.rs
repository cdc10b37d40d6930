//! FSM AI components (state, brain, config).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::replication::TickTimer;

/// AI FSM состояния (replicated)
///
/// Idle → Chase → Attack → Chase ...; любое → Dead (терминальное).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub enum AIState {
    /// Нет цели (или ждём retry после провала pathing)
    #[default]
    Idle,
    /// Бежим к цели
    Chase,
    /// Цель в радиусе атаки: разворот + melee
    Attack,
    /// Актёр мертв, AI отключен
    Dead,
}

impl AIState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AIState::Dead)
    }
}

/// Рабочая память AI (Authority-only, не реплицируется)
///
/// `target` это weak reference: Entity проверяется каждый тик, может исчезнуть.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct AIBrain {
    pub target: Option<Entity>,
    /// Когда пересматривать цель
    pub retarget: TickTimer,
    /// Cooldown повторного поиска после "no valid path"
    pub retry: TickTimer,
}

impl AIBrain {
    /// Retry cooldown ещё идёт (поиск цели запрещён)
    pub fn retry_pending(&self, tick: u64) -> bool {
        self.retry.is_running() && !self.retry.expired(tick)
    }

    pub fn forget_target(&mut self) {
        self.target = None;
        self.retarget.reset();
    }
}

/// Параметры AI
#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct AIConfig {
    /// Интервал пересмотра цели (секунды)
    pub retarget_interval: f32,
    /// Переключаемся только если новая цель ближе: newDist < currentDist × ratio
    pub target_switch_ratio: f32,
    /// Attack → Chase когда distance > attack_range × factor (hysteresis)
    pub attack_exit_factor: f32,
    /// Cooldown поиска после провала pathing (секунды)
    pub idle_retry_cooldown: f32,
    /// Радиус navigation sample вокруг цели
    pub destination_sample_radius: f32,
    /// Сколько раз удваивать радиус sample, прежде чем сдаться (Chase → Idle)
    pub destination_search_attempts: u32,
    pub detection_range: f32,
    pub attack_range: f32,
    /// Градусы в секунду
    pub rotation_speed: f32,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            retarget_interval: 0.1,
            target_switch_ratio: 0.7,
            attack_exit_factor: 1.2,
            idle_retry_cooldown: 1.0,
            destination_sample_radius: 2.0,
            destination_search_attempts: 3,
            detection_range: 50.0,
            attack_range: 2.0,
            rotation_speed: 720.0,
        }
    }
}

impl AIConfig {
    /// Дистанция выхода из Attack обратно в Chase
    pub fn exit_range(&self) -> f32 {
        self.attack_range * self.attack_exit_factor
    }

    /// Hysteresis переключения цели
    pub fn should_switch(&self, current_distance: f32, candidate_distance: f32) -> bool {
        candidate_distance < current_distance * self.target_switch_ratio
    }

    /// Максимальный поворот за тик (радианы)
    pub fn max_turn(&self, dt: f32) -> f32 {
        self.rotation_speed.to_radians() * dt
    }
}

/// Ближайший кандидат: (entity, distance)
///
/// Равные дистанции → меньший Entity (детерминизм).
pub fn nearest_candidate(candidates: impl IntoIterator<Item = (Entity, f32)>) -> Option<(Entity, f32)> {
    candidates.into_iter().fold(None, |best, (entity, distance)| match best {
        Some((best_entity, best_distance))
            if best_distance < distance || (best_distance == distance && best_entity < entity) =>
        {
            Some((best_entity, best_distance))
        }
        _ => Some((entity, distance)),
    })
}
