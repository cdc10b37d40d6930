//! Tests for damage resolution (Victim view).

#[cfg(test)]
mod tests {
    use super::super::melee::knockback_impulse;
    use crate::combat::components::{AttackRejected, MeleeCombat};
    use crate::combat::target::{try_attack, Arsenal, AttackKind, AttackOutcome, CombatTarget, DamageOutcome, Victim};
    use crate::components::Health;
    use crate::config::MeleeData;
    use crate::error::SimError;
    use crate::replication::{CombatStamps, EventKind, NetworkRole, NetworkTick};
    use bevy::prelude::*;

    fn tick_at(tick: u64) -> NetworkTick {
        NetworkTick {
            tick,
            delta_secs: 0.1,
        }
    }

    fn victim<'a>(
        role: NetworkRole,
        health: &'a mut Health,
        combat: Option<&'a mut MeleeCombat>,
        stamps: &'a mut CombatStamps,
    ) -> Victim<'a> {
        Victim {
            entity: Entity::from_raw(7),
            role,
            position: Vec3::ZERO,
            dead: false,
            health,
            combat,
            stamps,
        }
    }

    #[test]
    fn test_damage_subtracts_and_stamps_hit() {
        let mut health = Health::new(100.0);
        let mut stamps = CombatStamps::default();
        let mut v = victim(NetworkRole::Authority, &mut health, None, &mut stamps);

        let outcome = v.take_damage(25.0, &tick_at(3)).unwrap();
        assert_eq!(outcome, DamageOutcome::Damaged { dealt: 25.0, remaining: 75.0 });
        assert_eq!(health.current, 75.0);
        assert_eq!(stamps.get(EventKind::Hit).tick(), 3);
        assert!(!stamps.get(EventKind::Death).has_fired());
    }

    #[test]
    fn test_blocking_absorbs_fully() {
        let mut health = Health::new(100.0);
        let mut combat = MeleeCombat::default();
        combat.is_blocking = true;
        let mut stamps = CombatStamps::default();
        let mut v = victim(NetworkRole::Authority, &mut health, Some(&mut combat), &mut stamps);

        assert_eq!(v.take_damage(999.0, &tick_at(4)).unwrap(), DamageOutcome::Blocked);
        assert_eq!(health.current, 100.0);
        assert_eq!(stamps.get(EventKind::Blocked).tick(), 4);
        assert!(!stamps.get(EventKind::Hit).has_fired());
    }

    #[test]
    fn test_lethal_damage_floors_and_stamps_death() {
        let mut health = Health::new(30.0);
        let mut stamps = CombatStamps::default();
        let mut v = victim(NetworkRole::Authority, &mut health, None, &mut stamps);

        assert_eq!(v.take_damage(50.0, &tick_at(9)).unwrap(), DamageOutcome::Killed { dealt: 30.0 });
        assert!(!v.is_alive());
        // труп больше не принимает урон
        assert_eq!(v.take_damage(10.0, &tick_at(10)).unwrap(), DamageOutcome::Ignored);
        assert_eq!(health.current, 0.0);
        assert_eq!(stamps.get(EventKind::Death).tick(), 9);
    }

    #[test]
    fn test_damage_interrupts_pending_attack() {
        let mut health = Health::new(100.0);
        let mut combat = MeleeCombat::default();
        let mut stamps = CombatStamps::default();
        combat.begin_attack(&tick_at(1), true, &mut stamps).unwrap();

        let mut v = victim(NetworkRole::Authority, &mut health, Some(&mut combat), &mut stamps);
        v.take_damage(5.0, &tick_at(2)).unwrap();

        assert!(!combat.pending_damage);
        assert!(!combat.cooldown.is_running());
    }

    #[test]
    fn test_non_authority_cannot_damage_or_heal() {
        let mut health = Health::new(100.0);
        let mut stamps = CombatStamps::default();

        for role in [NetworkRole::Controller, NetworkRole::Observer] {
            let mut v = victim(role, &mut health, None, &mut stamps);
            let err = v.take_damage(10.0, &tick_at(1)).unwrap_err();
            assert!(matches!(err, SimError::AuthorityViolation { operation: "take_damage", .. }));
            assert!(v.heal(10.0).is_err());
        }
        assert_eq!(health.current, 100.0);
        assert_eq!(stamps, CombatStamps::default());
    }

    #[test]
    fn test_heal_clamped_and_ignored_for_dead() {
        let mut health = Health::new(100.0);
        health.take_damage(40.0);
        let mut stamps = CombatStamps::default();
        let mut v = victim(NetworkRole::Authority, &mut health, None, &mut stamps);

        assert_eq!(v.heal(100.0).unwrap(), 40.0);
        v.dead = true;
        assert_eq!(v.heal(10.0).unwrap(), 0.0);
    }

    fn melee(combat: &mut MeleeCombat) -> Arsenal<'_> {
        Arsenal {
            melee: Some(combat),
            ranged: None,
        }
    }

    #[test]
    fn test_try_attack_gated_by_authority() {
        let mut combat = MeleeCombat::default();
        let mut stamps = CombatStamps::default();
        let entity = Entity::from_raw(3);

        let err = try_attack(entity, NetworkRole::Observer, AttackKind::Melee, melee(&mut combat), &mut stamps, &tick_at(1), true)
            .unwrap_err();
        assert!(matches!(err, SimError::AuthorityViolation { .. }));
        assert!(!combat.pending_damage);

        let outcome =
            try_attack(entity, NetworkRole::Authority, AttackKind::Melee, melee(&mut combat), &mut stamps, &tick_at(1), true)
                .unwrap();
        assert_eq!(outcome, AttackOutcome::Started);
        let outcome =
            try_attack(entity, NetworkRole::Authority, AttackKind::Melee, melee(&mut combat), &mut stamps, &tick_at(2), true)
                .unwrap();
        assert!(matches!(outcome, AttackOutcome::Rejected(_)));
    }

    #[test]
    fn test_try_attack_without_weapon_is_unarmed() {
        let mut combat = MeleeCombat::default();
        let mut stamps = CombatStamps::default();
        let entity = Entity::from_raw(4);

        // У врага нет ranged оружия
        let outcome = try_attack(
            entity,
            NetworkRole::Authority,
            AttackKind::Ranged { aim_point: None },
            melee(&mut combat),
            &mut stamps,
            &tick_at(1),
            true,
        )
        .unwrap();
        assert_eq!(outcome, AttackOutcome::Rejected(AttackRejected::Unarmed));
        assert!(!stamps.get(EventKind::Shot).has_fired());
        assert!(!stamps.get(EventKind::Swing).has_fired());
    }

    #[test]
    fn test_knockback_impulse_points_away_from_attacker() {
        let stats = MeleeData::default();
        let impulse = knockback_impulse(Vec3::ZERO, Vec3::new(0.0, 0.0, -2.0), &stats);
        assert!((impulse.z + stats.knockback_force).abs() < 1e-5);
        assert_eq!(impulse.y, stats.knockback_lift);

        // совпадающие позиции: дефолтное направление, без NaN
        let impulse = knockback_impulse(Vec3::ONE, Vec3::ONE, &stats);
        assert!(impulse.is_finite());
    }
}
