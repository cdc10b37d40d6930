//! Population controller
//!
//! Спавн врагов по расписанию (continuous / waves), элитная квота,
//! ленивая очистка побеждённых. Только Authority.

use bevy::prelude::*;

pub mod archetype;
pub mod spawner;
pub mod wave;

pub use archetype::EnemyArchetype;
pub use spawner::{EnemySpawner, PopulationCommand};
pub use wave::{plan_wave, WavePlan};

use crate::SimulationSet;

/// Population Plugin (`SimulationSet::Population`)
///
/// 1. prune_defeated
/// 2. handle_population_commands
/// 3. update_spawner
pub struct PopulationPlugin;

impl Plugin for PopulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PopulationCommand>();

        app.add_systems(
            FixedUpdate,
            (
                spawner::prune_defeated,
                spawner::handle_population_commands,
                spawner::update_spawner,
            )
                .chain()
                .in_set(SimulationSet::Population),
        );
    }
}
