//! Player input → authoritative actions
//!
//! Input capture внешний: хост (или тест) пишет `PlayerInput` локального игрока,
//! substrate доставляет его на Authority. Здесь Authority-путь:
//! rotation → motor input → блок → TryAttack(Melee) / TryAttack(Ranged).
//!
//! Controller-путь (cosmetic prediction) того же input: в presentation.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::components::{Dead, MeleeCombat, RangedWeapon};
use crate::combat::target::{try_attack, Arsenal, AttackKind, AttackOutcome};
use crate::components::{Health, Orientation};
use crate::locomotion::CharacterMotor;
use crate::replication::{CombatStamps, NetworkRole, NetworkTick};
use crate::SimulationSet;

/// Input одного тика (локальный буфер, не authoritative state)
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct PlayerInput {
    /// x = strafe, y = forward
    pub movement: Vec2,
    /// Накопленный поворот за тик (радианы)
    pub yaw_delta: f32,
    pub jump: bool,
    /// Authority: TryAttack (сбрасывается после тика)
    pub attack: bool,
    /// Controller: ещё не предсказанный swing (сбрасывает presentation)
    pub attack_cue_pending: bool,
    pub block: bool,
    /// Authority: TryAttack(Ranged) (сбрасывается после тика)
    pub shoot: bool,
    /// Точка прицела (None = вдоль forward)
    pub aim_point: Option<Vec3>,
    /// Controller: ещё не предсказанный muzzle flash
    pub shoot_cue_pending: bool,
}

impl PlayerInput {
    /// Нажатие атаки: два пути от одного события
    pub fn press_attack(&mut self) {
        self.attack = true;
        self.attack_cue_pending = true;
    }

    /// Нажатие выстрела: тоже два пути
    pub fn press_shoot(&mut self, aim_point: Option<Vec3>) {
        self.shoot = true;
        self.aim_point = aim_point;
        self.shoot_cue_pending = true;
    }

    fn clear_one_shots(&mut self) {
        self.attack = false;
        self.shoot = false;
        self.jump = false;
        self.yaw_delta = 0.0;
    }

    pub fn rotate(&mut self, delta: f32) {
        self.yaw_delta += delta;
    }
}

/// System: применить input на Authority
///
/// One-shot поля (attack, shoot, jump, yaw_delta) потребляются здесь.
pub fn apply_player_input(
    tick: Res<NetworkTick>,
    mut players: Query<(
        Entity,
        &NetworkRole,
        &mut PlayerInput,
        &mut Orientation,
        &mut CharacterMotor,
        Option<&mut MeleeCombat>,
        Option<&mut RangedWeapon>,
        &mut CombatStamps,
        &Health,
        Has<Dead>,
    )>,
) {
    for (entity, role, mut input, mut orientation, mut motor, mut combat, mut weapon, mut stamps, health, dead) in
        players.iter_mut()
    {
        if !role.is_authority() {
            continue;
        }

        if dead {
            motor.reset();
            input.clear_one_shots();
            continue;
        }

        if input.yaw_delta != 0.0 {
            orientation.rotate_by(input.yaw_delta);
        }
        motor.move_input = input.movement;
        motor.jump_requested |= input.jump;

        if let Some(combat) = combat.as_mut() {
            combat.is_blocking = input.block;
        }

        let alive = health.is_alive();
        let mut attacks = Vec::new();
        if input.attack {
            attacks.push(AttackKind::Melee);
        }
        if input.shoot {
            attacks.push(AttackKind::Ranged {
                aim_point: input.aim_point,
            });
        }
        for kind in attacks {
            let arsenal = Arsenal {
                melee: combat.as_deref_mut(),
                ranged: weapon.as_deref_mut(),
            };
            match try_attack(entity, *role, kind, arsenal, &mut stamps, &tick, alive) {
                Ok(AttackOutcome::Started) => {}
                Ok(AttackOutcome::Rejected(reason)) => {
                    crate::logger::log(&format!("🚫 Player {:?} {:?} rejected: {:?}", entity, kind, reason));
                }
                Err(err) => err.report(),
            }
        }

        input.clear_one_shots();
    }
}

/// Input Plugin (`SimulationSet::Input`)
pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, apply_player_input.in_set(SimulationSet::Input));
    }
}
