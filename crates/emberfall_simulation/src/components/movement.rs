//! Movement компоненты: позиция, ориентация, скорость (replicated)
//!
//! Свои компоненты вместо Transform: replicated поля = ровно то, что пишет Authority.
//! Ориентация: только yaw (персонажи не наклоняются).

use std::f32::consts::{PI, TAU};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Позиция в мире (replicated)
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct Position(pub Vec3);

/// Скорость (replicated, м/с)
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct Velocity(pub Vec3);

/// Ориентация вокруг вертикальной оси (replicated)
///
/// Инвариант: yaw ∈ (-π, π]. yaw = 0 смотрит в +Z.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct Orientation {
    pub yaw: f32,
}

impl Orientation {
    pub fn from_yaw(yaw: f32) -> Self {
        Self {
            yaw: normalize_yaw(yaw),
        }
    }

    /// Yaw, смотрящий вдоль direction (горизонтальная проекция)
    pub fn looking_along(direction: Vec3) -> Option<Self> {
        let flat = Vec3::new(direction.x, 0.0, direction.z);
        if flat.length_squared() < 1e-6 {
            return None;
        }
        Some(Self::from_yaw(flat.x.atan2(flat.z)))
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Добавить rotation input (без разрывов на ±π)
    pub fn rotate_by(&mut self, delta: f32) {
        self.yaw = normalize_yaw(self.yaw + delta);
    }

    /// Повернуть к target_yaw не больше чем на max_step радиан
    pub fn rotate_towards(&mut self, target_yaw: f32, max_step: f32) {
        let diff = shortest_arc(self.yaw, target_yaw);
        let step = diff.clamp(-max_step.abs(), max_step.abs());
        self.yaw = normalize_yaw(self.yaw + step);
    }
}

/// Нормализация угла в (-π, π]
pub fn normalize_yaw(yaw: f32) -> f32 {
    if !yaw.is_finite() {
        return 0.0;
    }
    let mut wrapped = (yaw + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped += TAU;
    }
    wrapped
}

/// Сдвинуть `current` к `target` не больше чем на `max_delta`
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_delta || distance <= f32::EPSILON {
        target
    } else {
        current + delta / distance * max_delta
    }
}

/// Кратчайшая разница углов from → to, в (-π, π]
pub fn shortest_arc(from: f32, to: f32) -> f32 {
    normalize_yaw(to - from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_yaw_wraps() {
        assert!((normalize_yaw(TAU + 0.5) - 0.5).abs() < 1e-5);
        assert!((normalize_yaw(-TAU - 0.5) + 0.5).abs() < 1e-5);
        assert!((normalize_yaw(-PI) - PI).abs() < 1e-5);
        assert_eq!(normalize_yaw(f32::NAN), 0.0);
    }

    #[test]
    fn test_rotate_by_has_no_discontinuity() {
        let mut orientation = Orientation::from_yaw(PI - 0.1);
        orientation.rotate_by(0.2);
        assert!((orientation.yaw - (-PI + 0.1)).abs() < 1e-4);
    }

    #[test]
    fn test_rotate_towards_takes_short_way_and_caps_step() {
        let mut orientation = Orientation::from_yaw(PI - 0.1);
        // target чуть за границей π: короткий путь через +π
        orientation.rotate_towards(-PI + 0.1, 0.05);
        assert!((orientation.yaw - (PI - 0.05)).abs() < 1e-4);

        orientation.rotate_towards(-PI + 0.1, 1.0);
        assert!((orientation.yaw - (-PI + 0.1)).abs() < 1e-4);
    }

    #[test]
    fn test_forward_and_right_basis() {
        let orientation = Orientation::default();
        assert!((orientation.forward() - Vec3::Z).length() < 1e-6);
        assert!((orientation.right() - Vec3::X).length() < 1e-6);

        let facing_x = Orientation::looking_along(Vec3::new(3.0, 5.0, 0.0)).unwrap();
        assert!((facing_x.forward() - Vec3::X).length() < 1e-5);
        assert!(Orientation::looking_along(Vec3::Y).is_none());
    }
}
