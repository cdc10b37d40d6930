//! Ranged (hitscan) weapon component.
//!
//! Выстрел мгновенный: TryAttack(Ranged) взводит fire cooldown и кладёт
//! `PendingShot`, raycast делает Combat set на этом же тике.
//! Результат (точка попадания) реплицируется в `ShotTrace` для impact эффекта.

use bevy::prelude::*;

use crate::components::Orientation;
use crate::config::RangedData;
use crate::replication::{CombatStamps, EventKind, NetworkTick, TickTimer};

use super::melee::AttackRejected;

/// Выстрел, принятый на этом тике (raycast ещё не сделан)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PendingShot {
    /// Куда целился игрок. None = вдоль forward.
    pub aim_point: Option<Vec3>,
}

/// Hitscan оружие (пишет только Authority)
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct RangedWeapon {
    pub stats: RangedData,
    /// Fire rate: следующий выстрел не раньше истечения
    pub cooldown: TickTimer,
    pub pending: Option<PendingShot>,
}

impl Default for RangedWeapon {
    fn default() -> Self {
        Self::new(RangedData::default())
    }
}

impl RangedWeapon {
    pub fn new(stats: RangedData) -> Self {
        Self {
            stats,
            cooldown: TickTimer::NotRunning,
            pending: None,
        }
    }

    pub fn check_shot(&self, tick: u64, alive: bool) -> Result<(), AttackRejected> {
        if !alive {
            return Err(AttackRejected::Dead);
        }
        if !self.cooldown.expired_or_not_running(tick) || self.pending.is_some() {
            return Err(AttackRejected::CoolingDown);
        }
        Ok(())
    }

    /// Принять выстрел: cooldown + Shot stamp
    ///
    /// Вызывающий отвечает за authority gate (см. `try_attack`).
    pub fn begin_shot(
        &mut self,
        now: &NetworkTick,
        alive: bool,
        aim_point: Option<Vec3>,
        stamps: &mut CombatStamps,
    ) -> Result<(), AttackRejected> {
        self.check_shot(now.tick, alive)?;

        self.cooldown = TickTimer::from_seconds(now, self.stats.cooldown());
        self.pending = Some(PendingShot { aim_point });
        stamps.bump(EventKind::Shot, now.tick);
        Ok(())
    }

    pub fn take_pending(&mut self) -> Option<PendingShot> {
        self.pending.take()
    }

    /// Точка вылета луча
    pub fn muzzle(&self, position: Vec3) -> Vec3 {
        position + Vec3::Y * self.stats.muzzle_height
    }

    pub fn reset(&mut self) {
        self.cooldown.reset();
        self.pending = None;
    }
}

impl PendingShot {
    /// Направление луча: к aim point, иначе вдоль forward персонажа
    pub fn direction(&self, muzzle: Vec3, orientation: &Orientation) -> Vec3 {
        self.aim_point
            .and_then(|aim| (aim - muzzle).try_normalize())
            .unwrap_or_else(|| orientation.forward())
    }
}

/// Куда попал последний выстрел (replicated, для impact эффекта у всех peers)
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct ShotTrace {
    pub impact: Option<ShotImpact>,
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ShotImpact {
    pub point: Vec3,
    pub normal: Vec3,
}
