//! Enemy spawner (continuous / waves).
//!
//! Spawner: отдельная entity с `EnemySpawner` + `NetworkRole`. Решает только
//! Authority; заспавненные враги: обычные replicated entities.

use bevy::prelude::*;
use rand::Rng;

use crate::combat::components::Dead;
use crate::components::Health;
use crate::config::{SimulationConfig, SpawnMode};
use crate::error::SimError;
use crate::navigation::Navigation;
use crate::replication::{require_authority, NetIdAllocator, NetworkRole, NetworkTick, TickTimer};
use crate::DeterministicRng;

use super::archetype::EnemyArchetype;
use super::wave::{plan_wave, WavePlan};

/// Состояние population controller
#[derive(Component, Debug, Clone, Default)]
#[require(NetworkRole)]
pub struct EnemySpawner {
    /// Текущая волна (0 = ещё не начинали)
    pub wave: usize,
    /// Живые заспавненные враги (мёртвые / удалённые вычищаются лениво)
    pub spawned: Vec<Entity>,
    /// Continuous: интервал между спавнами
    pub spawn_timer: TickTimer,
    /// Waves: пауза между волнами (стартует только когда волна зачищена)
    pub wave_timer: TickTimer,
}

impl EnemySpawner {
    pub fn alive_count(&self) -> usize {
        self.spawned.len()
    }
}

/// Команды population controller (host tools, скрипты, тесты)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationCommand {
    /// Заспавнить одного случайного врага (вне расписания)
    SpawnRandom,
    /// Удалить всех заспавненных врагов
    DespawnAll,
    /// DespawnAll + волны с начала
    ResetWaves,
}

/// Общий контекст спавна (resources одного тика)
pub(crate) struct SpawnContext<'a, 'w, 's> {
    pub commands: &'a mut Commands<'w, 's>,
    pub config: &'a SimulationConfig,
    pub nav: &'a Navigation,
    pub rng: &'a mut DeterministicRng,
    pub ids: &'a mut NetIdAllocator,
}

impl SpawnContext<'_, '_, '_> {
    /// Случайный archetype из пула (elite / normal). Пустой пул → любой.
    fn pick_archetype(&mut self, elite: bool) -> Option<EnemyArchetype> {
        let archetypes = &self.config.spawner.archetypes;
        let pool: Vec<_> = archetypes.iter().filter(|a| a.elite == elite).collect();
        let pool = if pool.is_empty() {
            archetypes.iter().collect()
        } else {
            pool
        };
        if pool.is_empty() {
            return None;
        }
        let index = self.rng.rng.gen_range(0..pool.len());
        Some(EnemyArchetype::from(pool[index]))
    }

    /// Walkable точка рядом со случайной spawn point; радиус удваивается на каждой попытке
    fn resolve_spawn_position(&mut self) -> Result<Vec3, SimError> {
        let points = &self.config.spawner.spawn_points;
        let anchor = if points.is_empty() {
            Vec3::ZERO
        } else {
            Vec3::from_array(points[self.rng.rng.gen_range(0..points.len())])
        };

        self.nav.sample_widening(
            anchor,
            self.config.spawner.spawn_search_radius,
            self.config.spawner.spawn_search_attempts,
        )
    }

    /// Заспавнить одного врага
    pub fn spawn_enemy(&mut self, elite: bool) -> Result<Entity, SimError> {
        let archetype = self.pick_archetype(elite).ok_or(SimError::MissingCollaborator {
            owner: "enemy spawner".into(),
            what: "enemy archetypes",
        })?;
        let position = self.resolve_spawn_position()?;
        let id = self.ids.allocate();

        let entity = self
            .commands
            .spawn(archetype.bundle(id, position, &self.config.ai))
            .id();

        crate::logger::log(&format!(
            "👾 Spawned {}{} {:?} ({:?}) at {:?}",
            archetype.name(),
            if archetype.is_elite() { " [elite]" } else { "" },
            entity,
            id,
            position
        ));
        Ok(entity)
    }
}

/// System: лениво вычистить мёртвых / удалённых врагов из spawned
pub fn prune_defeated(mut spawners: Query<&mut EnemySpawner>, units: Query<(&Health, Has<Dead>)>) {
    for mut spawner in spawners.iter_mut() {
        let before = spawner.spawned.len();
        spawner
            .spawned
            .retain(|&unit| units.get(unit).is_ok_and(|(health, dead)| health.is_alive() && !dead));

        let removed = before - spawner.spawned.len();
        if removed > 0 {
            crate::logger::log(&format!(
                "🧹 Spawner: {} defeated unit(s) pruned, {} alive",
                removed,
                spawner.spawned.len()
            ));
        }
    }
}

/// Запустить следующую волну: элиты первыми
fn start_next_wave(spawner: &mut EnemySpawner, ctx: &mut SpawnContext) -> WavePlan {
    spawner.wave += 1;
    let plan = plan_wave(spawner.wave, &ctx.config.spawner, ctx.config.elite_archetype_count());

    crate::logger::log_info(&format!(
        "🌊 Wave {} started: {} enemies ({} elite)",
        plan.wave, plan.total, plan.elites
    ));

    for elite in plan.spawn_order() {
        match ctx.spawn_enemy(elite) {
            Ok(entity) => spawner.spawned.push(entity),
            Err(err) => err.report(),
        }
    }
    plan
}

/// System: расписание спавна (Authority-only)
pub fn update_spawner(
    mut commands: Commands,
    tick: Res<NetworkTick>,
    config: Res<SimulationConfig>,
    nav: Res<Navigation>,
    mut rng: ResMut<DeterministicRng>,
    mut ids: ResMut<NetIdAllocator>,
    mut spawners: Query<(&NetworkRole, &mut EnemySpawner)>,
) {
    if !config.spawner.auto_spawn {
        return;
    }

    let mut ctx = SpawnContext {
        commands: &mut commands,
        config: &config,
        nav: &nav,
        rng: &mut rng,
        ids: &mut ids,
    };

    for (role, mut spawner) in spawners.iter_mut() {
        if !role.is_authority() {
            continue;
        }

        match config.spawner.mode {
            SpawnMode::Continuous => {
                if !spawner.spawn_timer.is_running() {
                    spawner.spawn_timer = TickTimer::from_seconds(&tick, config.spawner.spawn_interval);
                    continue;
                }
                if !spawner.spawn_timer.expired(tick.tick) || spawner.alive_count() >= config.spawner.max_enemies {
                    continue;
                }
                match ctx.spawn_enemy(false) {
                    Ok(entity) => spawner.spawned.push(entity),
                    Err(err) => err.report(),
                }
                spawner.spawn_timer = TickTimer::from_seconds(&tick, config.spawner.spawn_interval);
            }
            SpawnMode::Waves => {
                if !spawner.spawned.is_empty() {
                    continue;
                }
                if spawner.wave == 0 {
                    start_next_wave(&mut spawner, &mut ctx);
                } else if !spawner.wave_timer.is_running() {
                    crate::logger::log_info(&format!(
                        "✅ Wave {} cleared, next wave in {:.1}s",
                        spawner.wave, config.spawner.time_between_waves
                    ));
                    spawner.wave_timer = TickTimer::from_seconds(&tick, config.spawner.time_between_waves);
                } else if spawner.wave_timer.expired(tick.tick) {
                    spawner.wave_timer.reset();
                    start_next_wave(&mut spawner, &mut ctx);
                }
            }
        }
    }
}

/// System: PopulationCommand (Authority-only)
pub fn handle_population_commands(
    mut commands: Commands,
    config: Res<SimulationConfig>,
    nav: Res<Navigation>,
    mut rng: ResMut<DeterministicRng>,
    mut ids: ResMut<NetIdAllocator>,
    mut requests: EventReader<PopulationCommand>,
    mut spawners: Query<(Entity, &NetworkRole, &mut EnemySpawner)>,
) {
    for request in requests.read() {
        for (entity, role, mut spawner) in spawners.iter_mut() {
            let operation = match request {
                PopulationCommand::SpawnRandom => "spawn_random",
                PopulationCommand::DespawnAll => "despawn_all",
                PopulationCommand::ResetWaves => "reset_waves",
            };
            if let Err(err) = require_authority(*role, entity, operation) {
                err.report();
                continue;
            }

            match request {
                PopulationCommand::SpawnRandom => {
                    let mut ctx = SpawnContext {
                        commands: &mut commands,
                        config: &config,
                        nav: &nav,
                        rng: &mut rng,
                        ids: &mut ids,
                    };
                    let elite = ctx.rng.rng.gen_bool(0.5);
                    match ctx.spawn_enemy(elite) {
                        Ok(unit) => spawner.spawned.push(unit),
                        Err(err) => err.report(),
                    }
                }
                PopulationCommand::DespawnAll => despawn_all(&mut commands, &mut spawner),
                PopulationCommand::ResetWaves => {
                    despawn_all(&mut commands, &mut spawner);
                    spawner.wave = 0;
                    spawner.wave_timer.reset();
                    spawner.spawn_timer.reset();
                    crate::logger::log_info("🔁 Waves reset");
                }
            }
        }
    }
}

fn despawn_all(commands: &mut Commands, spawner: &mut EnemySpawner) {
    let count = spawner.spawned.len();
    for unit in spawner.spawned.drain(..) {
        if let Ok(mut unit_commands) = commands.get_entity(unit) {
            unit_commands.despawn();
        }
    }
    crate::logger::log_info(&format!("🧹 Despawned {} enemies", count));
}
