//! Knockback override.
//!
//! Пока активен, полностью вытесняет locomotion и AI: entity летит по
//! собственной velocity с гравитацией, горизонталь гасится об препятствия,
//! позиция разрешается против navigation surface.

use bevy::prelude::*;

use crate::collision::Obstacles;
use crate::config::KnockbackConfig;
use crate::navigation::NavigationSurface;
use crate::replication::{NetworkTick, TickTimer};

/// Knockback state (replicated: flag + velocity + timer)
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct Knockback {
    pub active: bool,
    pub velocity: Vec3,
    pub timer: TickTimer,
    /// Последняя точка на walkable поверхности (fallback при вылете за край)
    pub last_valid_surface: Vec3,
}

impl Knockback {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Применить отбрасывание
    ///
    /// Вертикаль clamp'ится ОДИН раз здесь; дальше velocity меняет только гравитация.
    pub fn apply(&mut self, impulse: Vec3, config: &KnockbackConfig, now: &NetworkTick, position: Vec3) {
        let mut velocity = impulse;
        velocity.y = velocity.y.min(config.max_upward_velocity);

        if !self.active {
            self.last_valid_surface = position;
        }
        self.active = true;
        self.velocity = velocity;
        self.timer = TickTimer::from_seconds(now, config.duration);
    }

    pub fn expired(&self, tick: u64) -> bool {
        self.active && self.timer.expired(tick)
    }

    /// Один тик полёта. Возвращает новую позицию.
    pub fn integrate(
        &mut self,
        position: Vec3,
        dt: f32,
        config: &KnockbackConfig,
        body_radius: f32,
        obstacles: &Obstacles,
        surface: &dyn NavigationSurface,
    ) -> Vec3 {
        self.velocity.y = (self.velocity.y + config.gravity * dt).max(-config.max_fall_speed);

        let mut next = position;
        let horizontal = Vec3::new(self.velocity.x, 0.0, self.velocity.z) * dt;
        if horizontal != Vec3::ZERO {
            // sweep на уровне центра тела
            let from = position + Vec3::Y * body_radius;
            if obstacles.sweep(from, from + horizontal, body_radius).is_some() {
                self.velocity.x = 0.0;
                self.velocity.z = 0.0;
            } else {
                next += horizontal;
            }
        }
        next.y += self.velocity.y * dt;

        match surface.ground_height(next) {
            Some(ground) => {
                if next.y <= ground {
                    next.y = ground;
                    self.velocity.y = self.velocity.y.max(0.0);
                }
                self.last_valid_surface = Vec3::new(next.x, ground, next.z);
            }
            None => {
                // за краем walkable: остаёмся над последней валидной точкой
                next = Vec3::new(
                    self.last_valid_surface.x,
                    next.y.max(self.last_valid_surface.y),
                    self.last_valid_surface.z,
                );
                self.velocity.x = 0.0;
                self.velocity.z = 0.0;
            }
        }

        next
    }

    /// Завершить knockback: позиция приземления (snap на surface)
    pub fn finish(&mut self, position: Vec3, config: &KnockbackConfig, surface: &dyn NavigationSurface) -> Vec3 {
        let landing = surface
            .sample_point(position, config.surface_search_radius)
            .unwrap_or(self.last_valid_surface);
        self.cancel();
        landing
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.velocity = Vec3::ZERO;
        self.timer.reset();
    }
}
