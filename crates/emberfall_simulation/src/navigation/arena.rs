//! Плоская арена: прямоугольник пола минус заблокированные области
//!
//! Headless замена navmesh: пол на высоте `floor_y`, всё внутри `bounds`
//! и вне `blocked`: walkable. Связность не проверяется (арена односвязная).

use bevy::prelude::*;

use super::NavigationSurface;

/// Шаг кольцевого поиска walkable точки (метры)
const SAMPLE_STEP: f32 = 0.5;
/// Направлений на одно кольцо поиска
const SAMPLE_DIRECTIONS: usize = 16;
/// Максимум колец (дальше 128м не ищем, даже при огромном или бесконечном радиусе)
const MAX_SAMPLE_RINGS: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct ArenaSurface {
    /// Границы пола в плоскости XZ
    pub bounds: Rect,
    pub floor_y: f32,
    /// Непроходимые области (XZ)
    pub blocked: Vec<Rect>,
}

impl Default for ArenaSurface {
    fn default() -> Self {
        Self::square(30.0)
    }
}

impl ArenaSurface {
    /// Квадратная арена [-half, half]² на высоте 0
    pub fn square(half_extent: f32) -> Self {
        Self {
            bounds: Rect::new(-half_extent, -half_extent, half_extent, half_extent),
            floor_y: 0.0,
            blocked: Vec::new(),
        }
    }

    pub fn with_blocked(mut self, area: Rect) -> Self {
        self.blocked.push(area);
        self
    }

    pub fn is_walkable(&self, at: Vec3) -> bool {
        let p = Vec2::new(at.x, at.z);
        self.bounds.contains(p) && !self.blocked.iter().any(|r| r.contains(p))
    }

    fn on_floor(&self, at: Vec3) -> Vec3 {
        Vec3::new(at.x, self.floor_y, at.z)
    }
}

impl NavigationSurface for ArenaSurface {
    fn sample_point(&self, near: Vec3, max_radius: f32) -> Option<Vec3> {
        if self.is_walkable(near) {
            return Some(self.on_floor(near));
        }

        // Сначала clamp в bounds (самая близкая точка, если снаружи)
        let clamped = Vec3::new(
            near.x.clamp(self.bounds.min.x, self.bounds.max.x),
            near.y,
            near.z.clamp(self.bounds.min.y, self.bounds.max.y),
        );
        let mut best: Option<(f32, Vec3)> = None;
        let mut consider = |candidate: Vec3| {
            let distance = Vec2::new(candidate.x - near.x, candidate.z - near.z).length();
            if distance <= max_radius
                && self.is_walkable(candidate)
                && best.map_or(true, |(d, _)| distance < d)
            {
                best = Some((distance, candidate));
            }
        };
        consider(clamped);

        // Кольца вокруг near
        let rings = ((max_radius / SAMPLE_STEP).ceil() as usize).min(MAX_SAMPLE_RINGS);
        for ring in 1..=rings {
            let r = (ring as f32 * SAMPLE_STEP).min(max_radius);
            for i in 0..SAMPLE_DIRECTIONS {
                let angle = i as f32 / SAMPLE_DIRECTIONS as f32 * std::f32::consts::TAU;
                consider(near + Vec3::new(angle.cos() * r, 0.0, angle.sin() * r));
            }
        }

        best.map(|(_, p)| self.on_floor(p))
    }

    fn is_reachable(&self, from: Vec3, to: Vec3) -> bool {
        self.is_walkable(from) && self.is_walkable(to)
    }

    fn ground_height(&self, at: Vec3) -> Option<f32> {
        self.is_walkable(at).then_some(self.floor_y)
    }
}
