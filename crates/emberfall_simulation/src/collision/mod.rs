//! Collision queries (headless)
//!
//! Физики нет, только три запроса:
//! - volume query: какие hit volumes пересекают сферу (melee удар)
//! - sweep query: пересекает ли отрезок движения препятствие (knockback)
//! - raycast: первое пересечение луча с volume или препятствием (hitscan)
//!
//! Hit volume актора: вертикальная капсула от ног (Position) вверх на `height`.
//! Препятствия: axis-aligned boxes в resource `Obstacles`.

use bevy::prelude::*;

/// Collision layers (битовые маски)
///
/// - Layer (на каком слое объект): `CollisionVolume::layer`
/// - Mask (по каким слоям запрос): аргумент `overlap_sphere` / `MeleeData::target_mask`
pub mod layers {
    /// Игроки
    pub const PLAYERS: u32 = 0b10; // 2

    /// Враги
    pub const ENEMIES: u32 = 0b100; // 4

    /// Статичное окружение (стены, препятствия)
    pub const ENVIRONMENT: u32 = 0b1000; // 8

    /// Все акторы
    pub const ACTORS: u32 = PLAYERS | ENEMIES;
}

/// Hit volume актора
///
/// `enabled = false` после смерти (труп не принимает удары).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct CollisionVolume {
    pub radius: f32,
    pub height: f32,
    pub layer: u32,
    pub enabled: bool,
}

impl Default for CollisionVolume {
    fn default() -> Self {
        Self {
            radius: 0.5,
            height: 1.8,
            layer: layers::PLAYERS,
            enabled: true,
        }
    }
}

impl CollisionVolume {
    pub fn on_layer(layer: u32) -> Self {
        Self {
            layer,
            ..Self::default()
        }
    }

    pub fn matches(&self, mask: u32) -> bool {
        self.enabled && (self.layer & mask) != 0
    }

    /// Пересекает ли капсула (стоящая в `position`) сферу
    pub fn intersects_sphere(&self, position: Vec3, center: Vec3, radius: f32) -> bool {
        let bottom = position.y;
        let top = position.y + self.height;
        let closest = Vec3::new(position.x, center.y.clamp(bottom, top), position.z);
        closest.distance_squared(center) <= (radius + self.radius).powi(2)
    }

    /// Ближайшая точка оси капсулы к `point`
    fn axis_point(&self, position: Vec3, point: Vec3) -> Vec3 {
        Vec3::new(position.x, point.y.clamp(position.y, position.y + self.height), position.z)
    }

    /// Дистанция вдоль луча (direction нормализован) до входа в капсулу
    ///
    /// Капсула = вертикальный цилиндр [y, y + height] + полусферы на концах.
    pub fn ray_entry(&self, position: Vec3, origin: Vec3, direction: Vec3) -> Option<f32> {
        let bottom = position.y;
        let top = position.y + self.height;

        let side = ray_vertical_cylinder(origin, direction, position, self.radius)
            .filter(|t| (bottom..=top).contains(&(origin.y + direction.y * t)));
        let caps = [bottom, top]
            .into_iter()
            .filter_map(|y| ray_sphere(origin, direction, Vec3::new(position.x, y, position.z), self.radius));

        side.into_iter().chain(caps).min_by(|a, b| a.total_cmp(b))
    }
}

/// Вход луча в сферу (t ≥ 0; изнутри = 0)
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let b = offset.dot(direction);
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let disc = b * b - c;
    if b > 0.0 || disc < 0.0 {
        return None;
    }
    Some(-b - disc.sqrt())
}

/// Вход луча в бесконечный вертикальный цилиндр (t ≥ 0; изнутри = 0)
fn ray_vertical_cylinder(origin: Vec3, direction: Vec3, axis: Vec3, radius: f32) -> Option<f32> {
    let offset = Vec2::new(origin.x - axis.x, origin.z - axis.z);
    let flat = Vec2::new(direction.x, direction.z);
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let a = flat.length_squared();
    if a < 1e-8 {
        return None;
    }
    let b = offset.dot(flat);
    let disc = b * b - a * c;
    if b > 0.0 || disc < 0.0 {
        return None;
    }
    Some((-b - disc.sqrt()) / a)
}

/// Volume query: все entities, чьи volumes (по маске) пересекают сферу
///
/// Результат отсортирован по Entity: порядок применения урона детерминирован.
pub fn overlap_sphere<'a>(
    center: Vec3,
    radius: f32,
    mask: u32,
    candidates: impl IntoIterator<Item = (Entity, Vec3, &'a CollisionVolume)>,
) -> Vec<Entity> {
    let mut hits: Vec<Entity> = candidates
        .into_iter()
        .filter(|(_, position, volume)| {
            volume.matches(mask) && volume.intersects_sphere(*position, center, radius)
        })
        .map(|(entity, _, _)| entity)
        .collect();
    hits.sort();
    hits
}

/// Axis-aligned box препятствия
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    pub fn expanded(&self, by: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(by),
            max: self.max + Vec3::splat(by),
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Нормаль грани, ближайшей к точке на поверхности
    pub fn normal_at(&self, point: Vec3) -> Vec3 {
        let mut best = (f32::MAX, Vec3::Y);
        for axis in 0..3 {
            let mut unit = Vec3::ZERO;
            unit[axis] = 1.0;
            for (distance, normal) in [((point[axis] - self.min[axis]).abs(), -unit), ((self.max[axis] - point[axis]).abs(), unit)] {
                if distance < best.0 {
                    best = (distance, normal);
                }
            }
        }
        best.1
    }

    /// Slab test: доля отрезка [from, to] до первого входа в box
    pub fn segment_entry(&self, from: Vec3, to: Vec3) -> Option<f32> {
        if self.contains(from) {
            return Some(0.0);
        }
        let dir = to - from;
        let mut t_min = 0.0_f32;
        let mut t_max = 1.0_f32;

        for axis in 0..3 {
            let origin = from[axis];
            let delta = dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if delta.abs() < 1e-8 {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / delta;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }
}

/// Результат sweep query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Доля пути [0, 1] до контакта
    pub fraction: f32,
    pub point: Vec3,
}

/// Результат raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// None = препятствие окружения
    pub entity: Option<Entity>,
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Raycast: первое пересечение луча с volumes (по маске) и препятствиями
///
/// Препятствия участвуют, только если в маске есть `layers::ENVIRONMENT`.
/// Равные дистанции → меньший Entity (детерминизм).
pub fn raycast<'a>(
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    mask: u32,
    candidates: impl IntoIterator<Item = (Entity, Vec3, &'a CollisionVolume)>,
    obstacles: &Obstacles,
) -> Option<RayHit> {
    let direction = direction.try_normalize()?;

    let mut best: Option<RayHit> = None;
    for (entity, position, volume) in candidates {
        if !volume.matches(mask) {
            continue;
        }
        let Some(distance) = volume.ray_entry(position, origin, direction) else {
            continue;
        };
        if distance > max_distance {
            continue;
        }
        let closer = best.is_none_or(|hit| {
            distance < hit.distance || (distance == hit.distance && hit.entity.is_some_and(|e| entity < e))
        });
        if closer {
            let point = origin + direction * distance;
            best = Some(RayHit {
                entity: Some(entity),
                distance,
                point,
                normal: (point - volume.axis_point(position, point)).normalize_or(-direction),
            });
        }
    }

    if mask & layers::ENVIRONMENT != 0 {
        let end = origin + direction * max_distance;
        for aabb in &obstacles.boxes {
            let Some(fraction) = aabb.segment_entry(origin, end) else {
                continue;
            };
            let distance = fraction * max_distance;
            if best.is_none_or(|hit| distance < hit.distance) {
                let point = origin + direction * distance;
                best = Some(RayHit {
                    entity: None,
                    distance,
                    point,
                    normal: aabb.normal_at(point),
                });
            }
        }
    }

    best
}

/// Статичные препятствия арены
#[derive(Resource, Debug, Clone, Default)]
pub struct Obstacles {
    pub boxes: Vec<Aabb>,
}

impl Obstacles {
    pub fn new(boxes: Vec<Aabb>) -> Self {
        Self { boxes }
    }

    /// Sweep сферы радиуса `radius` вдоль [from, to]: ближайший контакт
    pub fn sweep(&self, from: Vec3, to: Vec3, radius: f32) -> Option<SweepHit> {
        self.boxes
            .iter()
            .filter_map(|aabb| aabb.expanded(radius).segment_entry(from, to))
            .min_by(|a, b| a.total_cmp(b))
            .map(|fraction| SweepHit {
                fraction,
                point: from.lerp(to, fraction),
            })
    }

    pub fn is_blocked(&self, point: Vec3, radius: f32) -> bool {
        self.boxes.iter().any(|aabb| aabb.expanded(radius).contains(point))
    }
}
