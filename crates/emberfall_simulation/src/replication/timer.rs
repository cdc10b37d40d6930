//! Replicated tick timer
//!
//! Timer = NotRunning | Running { target_tick }. "Expired": вычисляется из
//! текущего тика, поэтому при монотонном tick counter истёкший timer остаётся
//! истёкшим до явного `reset()`. Никаких callbacks, только polling.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::NetworkTick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum TickTimer {
    #[default]
    NotRunning,
    Running { target_tick: u64 },
}

impl TickTimer {
    /// Timer на `seconds` секунд от текущего тика
    pub fn from_seconds(now: &NetworkTick, seconds: f32) -> Self {
        TickTimer::Running {
            target_tick: now.tick + now.ticks_for(seconds),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TickTimer::Running { .. })
    }

    /// Запущен и target достигнут
    pub fn expired(&self, tick: u64) -> bool {
        match self {
            TickTimer::NotRunning => false,
            TickTimer::Running { target_tick } => tick >= *target_tick,
        }
    }

    pub fn expired_or_not_running(&self, tick: u64) -> bool {
        match self {
            TickTimer::NotRunning => true,
            TickTimer::Running { .. } => self.expired(tick),
        }
    }

    /// Сколько тиков осталось (None если не запущен)
    pub fn remaining_ticks(&self, tick: u64) -> Option<u64> {
        match self {
            TickTimer::NotRunning => None,
            TickTimer::Running { target_tick } => Some(target_tick.saturating_sub(tick)),
        }
    }

    pub fn reset(&mut self) {
        *self = TickTimer::NotRunning;
    }
}
