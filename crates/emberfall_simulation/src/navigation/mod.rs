//! Navigation service
//!
//! Pathfinding внешний: симуляции нужны только
//! - `sample_point(near, max_radius)`: walkable точка рядом с запрошенной
//! - `is_reachable(from, to)`: есть ли путь
//! - `ground_height(at)`: высота поверхности под точкой
//!
//! `NavAgent` это "move toward" примитив, держит destination и выдаёт velocity.

use bevy::prelude::*;

use crate::components::move_towards;
use crate::error::SimError;

pub mod arena;

pub use arena::ArenaSurface;

/// Верхняя граница расширений радиуса поиска (радиус удваивается на каждом)
pub const MAX_WIDENING_ATTEMPTS: u32 = 8;

/// Walkable поверхность (navmesh service)
pub trait NavigationSurface: Send + Sync + 'static {
    /// Ближайшая walkable точка в радиусе `max_radius` от `near`
    fn sample_point(&self, near: Vec3, max_radius: f32) -> Option<Vec3>;

    /// Есть ли путь от `from` до `to`
    fn is_reachable(&self, from: Vec3, to: Vec3) -> bool;

    /// Высота поверхности под точкой (None = вне walkable области)
    fn ground_height(&self, at: Vec3) -> Option<f32>;
}

/// Resource: активная navigation surface
#[derive(Resource)]
pub struct Navigation(pub Box<dyn NavigationSurface>);

impl Navigation {
    pub fn new(surface: impl NavigationSurface) -> Self {
        Self(Box::new(surface))
    }

    pub fn surface(&self) -> &dyn NavigationSurface {
        self.0.as_ref()
    }

    /// sample_point с ошибкой NavigationFailure вместо None
    pub fn sample(&self, near: Vec3, max_radius: f32) -> Result<Vec3, SimError> {
        self.0
            .sample_point(near, max_radius)
            .ok_or(SimError::NavigationFailure {
                near,
                radius: max_radius,
            })
    }

    /// sample с расширением радиуса: x2 на каждой неудачной попытке
    ///
    /// `attempts` ограничен `MAX_WIDENING_ATTEMPTS`. Ошибка несёт последний радиус.
    pub fn sample_widening(&self, near: Vec3, radius: f32, attempts: u32) -> Result<Vec3, SimError> {
        let attempts = attempts.clamp(1, MAX_WIDENING_ATTEMPTS);
        let mut radius = radius;
        for attempt in 0..attempts {
            match self.sample(near, radius) {
                Ok(point) => return Ok(point),
                Err(_) if attempt + 1 < attempts => radius *= 2.0,
                Err(err) => return Err(err),
            }
        }
        Err(SimError::NavigationFailure { near, radius })
    }
}

impl Default for Navigation {
    fn default() -> Self {
        Self::new(ArenaSurface::default())
    }
}

/// Navigation agent (pathing врага)
///
/// Authority-only: на остальных peers `enabled = false`, позиция приходит через репликацию.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct NavAgent {
    pub enabled: bool,
    pub destination: Option<Vec3>,
    /// Максимальная скорость (м/с)
    pub speed: f32,
    /// Ускорение (м/с²)
    pub acceleration: f32,
    pub stopping_distance: f32,
    /// Текущая скорость агента (горизонтальная)
    pub velocity: Vec3,
}

impl Default for NavAgent {
    fn default() -> Self {
        Self {
            enabled: true,
            destination: None,
            speed: 5.0,
            acceleration: 100.0,
            stopping_distance: 1.5,
            velocity: Vec3::ZERO,
        }
    }
}

impl NavAgent {
    /// Установить destination. false = агент выключен или пути нет (destination сброшен).
    pub fn set_destination(&mut self, surface: &dyn NavigationSurface, from: Vec3, point: Vec3) -> bool {
        if !self.enabled {
            return false;
        }
        if surface.is_reachable(from, point) {
            self.destination = Some(point);
            true
        } else {
            self.destination = None;
            false
        }
    }

    pub fn reset_path(&mut self) {
        self.destination = None;
    }

    /// Выключить pathing (смерть, knockback)
    pub fn disable(&mut self) {
        self.enabled = false;
        self.destination = None;
        self.velocity = Vec3::ZERO;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Дошёл ли агент до destination (или её нет)
    pub fn has_arrived(&self, position: Vec3) -> bool {
        match self.destination {
            None => true,
            Some(dest) => flat(dest - position).length() <= self.stopping_distance,
        }
    }

    /// Пересчитать velocity на один тик
    pub fn steer(&mut self, position: Vec3, dt: f32) -> Vec3 {
        let desired = match (self.enabled, self.destination) {
            (true, Some(dest)) if !self.has_arrived(position) => {
                flat(dest - position).normalize_or_zero() * self.speed
            }
            _ => Vec3::ZERO,
        };
        self.velocity = move_towards(self.velocity, desired, self.acceleration * dt);
        self.velocity
    }
}

fn flat(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
