//! CombatTarget capability
//!
//! Игрок и враг принимают урон одинаково: одна view-структура `Victim`,
//! собранная из компонентов entity, реализует `CombatTarget`.

use bevy::prelude::*;

use crate::components::Health;
use crate::error::SimError;
use crate::replication::{require_authority, CombatStamps, EventKind, NetworkRole, NetworkTick};

use super::components::{AttackRejected, MeleeCombat, RangedWeapon};

/// Исход TakeDamage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Цель уже мертва
    Ignored,
    /// Поглощено блоком (health не изменился)
    Blocked,
    Damaged { dealt: f32, remaining: f32 },
    Killed { dealt: f32 },
}

impl DamageOutcome {
    /// Удар достиг цели (для Landed stamp)
    pub fn connected(&self) -> bool {
        !matches!(self, DamageOutcome::Ignored)
    }
}

/// Цель боевого взаимодействия
pub trait CombatTarget {
    fn is_alive(&self) -> bool;
    fn position(&self) -> Vec3;
    fn take_damage(&mut self, amount: f32, now: &NetworkTick) -> Result<DamageOutcome, SimError>;
}

/// View над компонентами entity, принимающей урон
pub struct Victim<'a> {
    pub entity: Entity,
    pub role: NetworkRole,
    pub position: Vec3,
    /// Explicit death marker (`Dead`)
    pub dead: bool,
    pub health: &'a mut Health,
    pub combat: Option<&'a mut MeleeCombat>,
    pub stamps: &'a mut CombatStamps,
}

impl Victim<'_> {
    /// Heal (Authority-only, clamp к max). Мёртвых не лечим.
    pub fn heal(&mut self, amount: f32) -> Result<f32, SimError> {
        require_authority(self.role, self.entity, "heal")?;
        if !self.is_alive() {
            return Ok(0.0);
        }
        Ok(self.health.heal(amount))
    }
}

impl CombatTarget for Victim<'_> {
    fn is_alive(&self) -> bool {
        self.health.is_alive() && !self.dead
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn take_damage(&mut self, amount: f32, now: &NetworkTick) -> Result<DamageOutcome, SimError> {
        require_authority(self.role, self.entity, "take_damage")?;

        if !self.is_alive() {
            return Ok(DamageOutcome::Ignored);
        }

        if self.combat.as_ref().is_some_and(|c| c.is_blocking) {
            self.stamps.bump(EventKind::Blocked, now.tick);
            return Ok(DamageOutcome::Blocked);
        }

        let dealt = self.health.take_damage(amount);

        if let Some(combat) = self.combat.as_deref_mut() {
            if combat.interrupt_attack() {
                crate::logger::log(&format!(
                    "✋ Attack interrupted by incoming damage (entity: {:?})",
                    self.entity
                ));
            }
            combat.apply_hit_stun(now);
        }

        if self.health.is_alive() {
            self.stamps.bump(EventKind::Hit, now.tick);
            Ok(DamageOutcome::Damaged {
                dealt,
                remaining: self.health.current,
            })
        } else {
            self.stamps.bump(EventKind::Death, now.tick);
            Ok(DamageOutcome::Killed { dealt })
        }
    }
}

/// Вид атаки
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum AttackKind {
    /// Windup → delayed damage по overlap сфере
    Melee,
    /// Мгновенный hitscan выстрел
    Ranged { aim_point: Option<Vec3> },
}

/// Оружие атакующего (у врага только melee)
#[derive(Default)]
pub struct Arsenal<'a> {
    pub melee: Option<&'a mut MeleeCombat>,
    pub ranged: Option<&'a mut RangedWeapon>,
}

/// Исход TryAttack на Authority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    Started,
    Rejected(AttackRejected),
}

/// TryAttack (Authority path): authority gate + `begin_attack` / `begin_shot`
///
/// Controller path (cosmetic prediction): в presentation, сюда не приходит.
pub fn try_attack(
    entity: Entity,
    role: NetworkRole,
    kind: AttackKind,
    arsenal: Arsenal<'_>,
    stamps: &mut CombatStamps,
    now: &NetworkTick,
    alive: bool,
) -> Result<AttackOutcome, SimError> {
    require_authority(role, entity, "try_attack")?;

    let started = match (kind, arsenal) {
        (AttackKind::Melee, Arsenal { melee: Some(combat), .. }) => combat
            .begin_attack(now, alive, stamps)
            .map(|()| {
                crate::logger::log(&format!(
                    "⚔️ Melee attack started (attacker: {:?}, tick: {}, windup: {:.2}s)",
                    entity, now.tick, combat.stats.damage_delay
                ))
            }),
        (AttackKind::Ranged { aim_point }, Arsenal { ranged: Some(weapon), .. }) => weapon
            .begin_shot(now, alive, aim_point, stamps)
            .map(|()| {
                crate::logger::log(&format!(
                    "🔫 Shot fired (shooter: {:?}, tick: {}, aim: {:?})",
                    entity, now.tick, aim_point
                ))
            }),
        _ => Err(AttackRejected::Unarmed),
    };

    Ok(match started {
        Ok(()) => AttackOutcome::Started,
        Err(reason) => AttackOutcome::Rejected(reason),
    })
}
