//! Melee combat component.
//!
//! Delayed-damage атака: TryAttack взводит windup (`damage_delay`) и cooldown,
//! урон считается только когда windup истёк. Всё состояние: replicated timers.

use bevy::prelude::*;

use crate::components::Orientation;
use crate::config::MeleeData;
use crate::replication::{CombatStamps, EventKind, NetworkTick, TickTimer};

// ============================================================================
// Melee Combat Component
// ============================================================================

/// Состояние melee атаки одного атакующего (пишет только Authority)
///
/// Инвариант: не больше одного pending windup на атакующего.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct MeleeCombat {
    pub stats: MeleeData,
    /// Windup взведён, урон ещё не нанесён
    pub pending_damage: bool,
    pub damage_delay: TickTimer,
    pub cooldown: TickTimer,
    pub hit_stun: TickTimer,
    /// Блок: входящий урон полностью поглощается
    pub is_blocking: bool,
}

impl Default for MeleeCombat {
    fn default() -> Self {
        Self::new(MeleeData::default())
    }
}

/// Почему атака не началась
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum AttackRejected {
    Dead,
    CoolingDown,
    HitStunned,
    WindupPending,
    /// Нет оружия для этого вида атаки
    Unarmed,
}

impl MeleeCombat {
    pub fn new(stats: MeleeData) -> Self {
        Self {
            stats,
            pending_damage: false,
            damage_delay: TickTimer::NotRunning,
            cooldown: TickTimer::NotRunning,
            hit_stun: TickTimer::NotRunning,
            is_blocking: false,
        }
    }

    /// CanAttack = hit-stun истёк ∧ жив
    pub fn can_attack(&self, tick: u64, alive: bool) -> bool {
        alive && self.hit_stun.expired_or_not_running(tick)
    }

    /// Проверка без изменения состояния
    pub fn check_attack(&self, tick: u64, alive: bool) -> Result<(), AttackRejected> {
        if !alive {
            return Err(AttackRejected::Dead);
        }
        if !self.cooldown.expired_or_not_running(tick) {
            return Err(AttackRejected::CoolingDown);
        }
        if self.pending_damage {
            return Err(AttackRejected::WindupPending);
        }
        if !self.can_attack(tick, alive) {
            return Err(AttackRejected::HitStunned);
        }
        Ok(())
    }

    /// Начать атаку: windup + cooldown + Swing stamp
    ///
    /// Вызывающий отвечает за authority gate (см. `try_attack`).
    pub fn begin_attack(
        &mut self,
        now: &NetworkTick,
        alive: bool,
        stamps: &mut CombatStamps,
    ) -> Result<(), AttackRejected> {
        self.check_attack(now.tick, alive)?;

        self.damage_delay = TickTimer::from_seconds(now, self.stats.damage_delay);
        self.pending_damage = true;
        self.cooldown = TickTimer::from_seconds(now, self.stats.cooldown);
        stamps.bump(EventKind::Swing, now.tick);
        Ok(())
    }

    /// Отменить pending атаку (атакующий получил урон)
    ///
    /// Только pending true → false; cooldown сбрасывается: можно сразу атаковать снова.
    pub fn interrupt_attack(&mut self) -> bool {
        if !self.pending_damage {
            return false;
        }
        self.pending_damage = false;
        self.damage_delay.reset();
        self.cooldown.reset();
        true
    }

    /// Windup истёк: пора считать урон
    pub fn damage_due(&self, tick: u64) -> bool {
        self.pending_damage && self.damage_delay.expired(tick)
    }

    /// Снять pending после разрешения удара (cooldown продолжает идти)
    pub fn finish_windup(&mut self) {
        self.pending_damage = false;
        self.damage_delay.reset();
    }

    pub fn apply_hit_stun(&mut self, now: &NetworkTick) {
        if self.stats.hit_stun > 0.0 {
            self.hit_stun = TickTimer::from_seconds(now, self.stats.hit_stun);
        }
    }

    /// Центр overlap сферы: полдистанции вперёд, 1м вверх
    pub fn attack_point(&self, position: Vec3, orientation: &Orientation) -> Vec3 {
        position + orientation.forward() * (self.stats.range * 0.5) + Vec3::Y
    }

    /// Сбросить всё боевое состояние (респавн)
    pub fn reset(&mut self) {
        self.pending_damage = false;
        self.damage_delay.reset();
        self.cooldown.reset();
        self.hit_stun.reset();
        self.is_blocking = false;
    }
}
