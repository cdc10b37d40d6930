//! FSM AI systems (state transitions, attack execution).

use bevy::prelude::*;

use crate::ai::components::{AIBrain, AIConfig, AIState};
use crate::combat::components::{Dead, Knockback, MeleeCombat};
use crate::combat::target::{try_attack, Arsenal, AttackKind, AttackOutcome};
use crate::components::{Health, Orientation, Position};
use crate::navigation::NavAgent;
use crate::replication::{CombatStamps, NetworkRole, NetworkTick};

use super::targeting::flat_distance;

/// Система: AI FSM transitions (Authority-only)
///
/// Порядок приоритетов:
/// 1. Dead (health ≤ 0 или Dead marker): терминальное, pathing выключен
/// 2. Knockback активен: FSM заморожена
/// 3. Idle → Chase → Attack → Chase (hysteresis на выходе из Attack)
///
/// В Attack: разворот к цели, по готовности TryAttack (windup → delayed damage).
pub fn ai_fsm_transitions(
    tick: Res<NetworkTick>,
    mut ai_query: Query<(
        Entity,
        &NetworkRole,
        &mut AIState,
        &AIBrain,
        &AIConfig,
        &Position,
        &mut Orientation,
        &Health,
        &Knockback,
        Option<&mut NavAgent>,
        Option<&mut MeleeCombat>,
        &mut CombatStamps,
        Has<Dead>,
    )>,
    targets: Query<&Position>,
) {
    for (
        entity,
        role,
        mut state,
        brain,
        config,
        position,
        mut orientation,
        health,
        knockback,
        mut agent,
        combat,
        mut stamps,
        dead,
    ) in ai_query.iter_mut()
    {
        if !role.is_authority() || state.is_terminal() {
            continue;
        }

        if dead || !health.is_alive() {
            crate::logger::log(&format!("💀 AI {:?} {:?} → Dead", entity, *state));
            *state = AIState::Dead;
            if let Some(agent) = agent.as_mut() {
                agent.disable();
            }
            continue;
        }

        if knockback.is_active() {
            continue;
        }

        let target_pos = brain.target.and_then(|t| targets.get(t).ok()).map(|p| p.0);

        let next = match (*state, target_pos) {
            (AIState::Idle, Some(_)) => AIState::Chase,
            (AIState::Idle, None) => AIState::Idle,
            (_, None) => AIState::Idle,
            (AIState::Chase, Some(target)) => {
                if flat_distance(position.0, target) <= config.attack_range {
                    AIState::Attack
                } else {
                    AIState::Chase
                }
            }
            (AIState::Attack, Some(target)) => {
                if flat_distance(position.0, target) > config.exit_range() {
                    AIState::Chase
                } else {
                    AIState::Attack
                }
            }
            (AIState::Dead, _) => AIState::Dead,
        };

        if next != *state {
            crate::logger::log(&format!("🧠 AI {:?} {:?} → {:?}", entity, *state, next));
            if matches!(next, AIState::Attack | AIState::Idle) {
                if let Some(agent) = agent.as_mut() {
                    agent.reset_path();
                }
            }
            *state = next;
        }

        if *state != AIState::Attack {
            continue;
        }
        let Some(target) = target_pos else {
            continue;
        };

        // Разворот к цели
        if let Some(facing) = Orientation::looking_along(target - position.0) {
            orientation.rotate_towards(facing.yaw, config.max_turn(tick.delta_secs));
        }

        let Some(mut combat) = combat else {
            continue;
        };
        if combat.check_attack(tick.tick, true).is_err() {
            continue;
        }
        let arsenal = Arsenal {
            melee: Some(&mut *combat),
            ranged: None,
        };
        match try_attack(entity, *role, AttackKind::Melee, arsenal, &mut stamps, &tick, true) {
            Ok(AttackOutcome::Started) => {}
            Ok(AttackOutcome::Rejected(reason)) => {
                crate::logger::log(&format!("🚫 AI {:?} attack rejected: {:?}", entity, reason));
            }
            Err(err) => err.report(),
        }
    }
}
