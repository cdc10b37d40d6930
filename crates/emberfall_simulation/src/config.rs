//! Data assets симуляции (RON)
//!
//! Все значения по умолчанию: из исходных data assets игры
//! (CharacterData, EnemyData, MeleeController, EnemySpawner).
//! `SimulationConfig`: один resource, грузится из RON текста или файла.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::AIConfig;
use crate::collision::layers;
use crate::error::ConfigError;
use crate::navigation::MAX_WIDENING_ATTEMPTS;

/// Параметры игрока (движение + здоровье)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct CharacterData {
    pub max_health: f32,
    pub movement_speed: f32,
    pub jump_force: f32,
    pub acceleration: f32,
    pub braking: f32,
    pub gravity: f32,
    /// Hit-stun после полученного урона (секунды). 0 = игрок может атаковать сразу.
    pub hit_stun: f32,
    /// Выстрелов в секунду (hitscan)
    pub fire_rate: f32,
    pub bullet_damage: f32,
}

impl Default for CharacterData {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            movement_speed: 6.0,
            jump_force: 8.0,
            acceleration: 10.0,
            braking: 10.0,
            gravity: -20.0,
            hit_stun: 0.0,
            fire_rate: 1.0,
            bullet_damage: 10.0,
        }
    }
}

impl CharacterData {
    /// Параметры hitscan оружия игрока
    pub fn ranged_data(&self) -> RangedData {
        RangedData {
            damage: self.bullet_damage,
            fire_rate: self.fire_rate,
            ..RangedData::default()
        }
    }
}

/// Параметры hitscan выстрела (урон мгновенный, без windup)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct RangedData {
    pub damage: f32,
    /// Выстрелов в секунду: cooldown = 1 / fire_rate
    pub fire_rate: f32,
    pub max_range: f32,
    /// Высота точки вылета над Position (уровень глаз)
    pub muzzle_height: f32,
    /// Маска слоёв луча (ENVIRONMENT = стены останавливают пулю)
    pub target_mask: u32,
}

impl Default for RangedData {
    fn default() -> Self {
        Self {
            damage: 10.0,
            fire_rate: 1.0,
            max_range: 100.0,
            muzzle_height: 1.6,
            target_mask: layers::ACTORS | layers::ENVIRONMENT,
        }
    }
}

impl RangedData {
    pub fn cooldown(&self) -> f32 {
        1.0 / self.fire_rate
    }
}

/// Параметры melee атаки (delayed damage)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct MeleeData {
    pub damage: f32,
    /// Дистанция удара (attack point = 0.5 * range вперёд)
    pub range: f32,
    /// Радиус overlap сферы в attack point
    pub radius: f32,
    pub cooldown: f32,
    /// Windup: задержка между началом замаха и нанесением урона
    pub damage_delay: f32,
    pub hit_stun: f32,
    /// Горизонтальная сила отбрасывания (0 = без knockback)
    pub knockback_force: f32,
    /// Вертикальная составляющая отбрасывания
    pub knockback_lift: f32,
    /// Маска слоёв, по которым бьёт удар
    pub target_mask: u32,
}

impl Default for MeleeData {
    fn default() -> Self {
        Self {
            damage: 25.0,
            range: 2.0,
            radius: 1.0,
            cooldown: 0.8,
            damage_delay: 0.3,
            hit_stun: 0.0,
            knockback_force: 6.0,
            knockback_lift: 2.0,
            target_mask: layers::ACTORS,
        }
    }
}

/// Параметры врага (одного archetype)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct EnemyData {
    pub max_health: f32,
    pub movement_speed: f32,
    /// Градусы в секунду
    pub rotation_speed: f32,
    pub acceleration: f32,
    pub stopping_distance: f32,
    pub attack_damage: f32,
    pub attack_range: f32,
    pub attack_radius: f32,
    pub attack_cooldown: f32,
    pub attack_windup: f32,
    pub hit_stun: f32,
}

impl Default for EnemyData {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            movement_speed: 5.0,
            rotation_speed: 720.0,
            acceleration: 100.0,
            stopping_distance: 1.5,
            attack_damage: 15.0,
            attack_range: 2.0,
            attack_radius: 1.0,
            attack_cooldown: 1.5,
            attack_windup: 0.3,
            hit_stun: 0.3,
        }
    }
}

impl EnemyData {
    /// Melee параметры врага (враги бьют только игроков, без отбрасывания)
    pub fn melee_data(&self) -> MeleeData {
        MeleeData {
            damage: self.attack_damage,
            range: self.attack_range,
            radius: self.attack_radius,
            cooldown: self.attack_cooldown,
            damage_delay: self.attack_windup,
            hit_stun: self.hit_stun,
            knockback_force: 0.0,
            knockback_lift: 0.0,
            target_mask: layers::PLAYERS,
        }
    }
}

/// Параметры отбрасывания
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct KnockbackConfig {
    pub duration: f32,
    /// Максимальная вертикальная скорость в момент применения
    pub max_upward_velocity: f32,
    pub max_fall_speed: f32,
    pub gravity: f32,
    /// Радиус поиска walkable точки при приземлении
    pub surface_search_radius: f32,
}

impl Default for KnockbackConfig {
    fn default() -> Self {
        Self {
            duration: 0.3,
            max_upward_velocity: 4.0,
            max_fall_speed: 20.0,
            gravity: -20.0,
            surface_search_radius: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum SpawnMode {
    /// Один враг каждые `spawn_interval` секунд, пока население < cap
    #[default]
    Continuous,
    /// Волны с ростом числа врагов и элитной квотой
    Waves,
}

/// Один тип врага для спавнера
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
pub struct ArchetypeData {
    pub name: String,
    #[serde(default)]
    pub elite: bool,
    /// None = data asset не назначен (MissingCollaborator, fallback на default)
    #[serde(default)]
    pub data: Option<EnemyData>,
}

/// Параметры population controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct SpawnerConfig {
    pub mode: SpawnMode,
    pub auto_spawn: bool,
    pub max_enemies: usize,
    pub spawn_interval: f32,
    pub enemies_per_wave: usize,
    pub wave_growth: usize,
    pub time_between_waves: f32,
    pub base_elite: usize,
    pub elite_interval: usize,
    /// Точки спавна врагов
    pub spawn_points: Vec<[f32; 3]>,
    /// Начальный радиус поиска walkable точки
    pub spawn_search_radius: f32,
    /// Сколько раз расширять радиус (x2) прежде чем сдаться
    pub spawn_search_attempts: u32,
    pub archetypes: Vec<ArchetypeData>,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            mode: SpawnMode::Continuous,
            auto_spawn: true,
            max_enemies: 10,
            spawn_interval: 5.0,
            enemies_per_wave: 5,
            wave_growth: 2,
            time_between_waves: 30.0,
            base_elite: 1,
            elite_interval: 2,
            spawn_points: vec![
                [12.0, 0.0, 12.0],
                [-12.0, 0.0, 12.0],
                [12.0, 0.0, -12.0],
                [-12.0, 0.0, -12.0],
            ],
            spawn_search_radius: 2.0,
            spawn_search_attempts: 3,
            archetypes: vec![
                ArchetypeData {
                    name: "grunt".into(),
                    elite: false,
                    data: Some(EnemyData::default()),
                },
                ArchetypeData {
                    name: "skirmisher".into(),
                    elite: false,
                    data: Some(EnemyData {
                        max_health: 70.0,
                        movement_speed: 6.5,
                        attack_damage: 10.0,
                        attack_cooldown: 1.0,
                        ..EnemyData::default()
                    }),
                },
                ArchetypeData {
                    name: "brute".into(),
                    elite: true,
                    data: Some(EnemyData {
                        max_health: 250.0,
                        movement_speed: 3.5,
                        attack_damage: 30.0,
                        attack_range: 2.5,
                        attack_cooldown: 2.0,
                        attack_windup: 0.5,
                        hit_stun: 0.1,
                        ..EnemyData::default()
                    }),
                },
                ArchetypeData {
                    name: "warden".into(),
                    elite: true,
                    data: Some(EnemyData {
                        max_health: 180.0,
                        attack_damage: 20.0,
                        attack_cooldown: 1.2,
                        ..EnemyData::default()
                    }),
                },
            ],
        }
    }
}

/// Смерть / удаление / респавн
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Через сколько секунд после смерти удаляется враг
    pub enemy_despawn_delay: f32,
    pub respawn_delay: f32,
    pub player_spawn_points: Vec<[f32; 3]>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            enemy_despawn_delay: 3.0,
            respawn_delay: 3.0,
            player_spawn_points: vec![[0.0, 0.0, 0.0], [3.0, 0.0, 0.0], [-3.0, 0.0, 0.0], [0.0, 0.0, 3.0]],
        }
    }
}

/// Корневой конфиг симуляции
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_rate: f32,
    pub character: CharacterData,
    pub player_melee: MeleeData,
    pub knockback: KnockbackConfig,
    pub spawner: SpawnerConfig,
    pub lifecycle: LifecycleConfig,
    pub ai: AIConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            character: CharacterData::default(),
            player_melee: MeleeData::default(),
            knockback: KnockbackConfig::default(),
            spawner: SpawnerConfig::default(),
            lifecycle: LifecycleConfig::default(),
            ai: AIConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_rate > 0.0) {
            return Err(ConfigError::Invalid(format!("tick_rate must be positive, got {}", self.tick_rate)));
        }
        if self.character.max_health <= 0.0 {
            return Err(ConfigError::Invalid("character.max_health must be positive".into()));
        }
        if self.spawner.max_enemies == 0 {
            return Err(ConfigError::Invalid("spawner.max_enemies must be at least 1".into()));
        }
        if self.lifecycle.player_spawn_points.is_empty() {
            return Err(ConfigError::Invalid("lifecycle.player_spawn_points is empty".into()));
        }
        if !(self.character.fire_rate > 0.0 && self.character.fire_rate.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "character.fire_rate must be positive, got {}",
                self.character.fire_rate
            )));
        }
        validate_search("spawner.spawn_search", self.spawner.spawn_search_radius, self.spawner.spawn_search_attempts)?;
        validate_search(
            "ai.destination_search",
            self.ai.destination_sample_radius,
            self.ai.destination_search_attempts,
        )?;
        Ok(())
    }

    /// Количество элитных archetypes (верхняя граница элитной квоты)
    pub fn elite_archetype_count(&self) -> usize {
        self.spawner.archetypes.iter().filter(|a| a.elite).count()
    }
}

/// Радиус поиска конечный и положительный, расширений не больше MAX_WIDENING_ATTEMPTS
fn validate_search(name: &str, radius: f32, attempts: u32) -> Result<(), ConfigError> {
    if !(radius > 0.0 && radius.is_finite()) {
        return Err(ConfigError::Invalid(format!("{}_radius must be positive, got {}", name, radius)));
    }
    if attempts == 0 || attempts > MAX_WIDENING_ATTEMPTS {
        return Err(ConfigError::Invalid(format!(
            "{}_attempts must be in 1..={}, got {}",
            name, MAX_WIDENING_ATTEMPTS, attempts
        )));
    }
    Ok(())
}
