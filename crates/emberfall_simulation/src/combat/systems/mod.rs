//! Combat systems

pub mod damage;
pub mod knockback;
pub mod melee;
pub mod ranged;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod damage_tests;

pub use damage::*;
pub use knockback::*;
pub use melee::*;
pub use ranged::*;

use bevy::prelude::*;

use crate::components::{Health, Orientation, Position};
use crate::replication::{CombatStamps, NetworkRole};

use super::components::{Dead, MeleeCombat};

/// Всё, что нужно чтобы собрать `Victim` (и атакующего) из одной query
pub type CombatantData = (
    Entity,
    &'static NetworkRole,
    &'static Position,
    &'static Orientation,
    &'static mut Health,
    Option<&'static mut MeleeCombat>,
    &'static mut CombatStamps,
    Has<Dead>,
);
