//! Built-in timed attack resolution.
//!
//! After a unit commits an attack the battle waits for the projectile or
//! beam to arrive before applying damage. Projectiles take longer the
//! farther they fly, beams sweep then hold, close attacks are quick.

use crate::data::AttackTimings;
use crate::hex::HexCoord;
use crate::math::Fixed;
use crate::units::{AttackType, UnitId};

/// Seconds between committing an attack and its damage landing.
#[must_use]
pub fn attack_duration(
    attack_type: AttackType,
    from: HexCoord,
    to: HexCoord,
    timings: &AttackTimings,
) -> Fixed {
    match attack_type {
        AttackType::Shoot | AttackType::Artillery => {
            let max_distance = timings.max_flight_distance.max(Fixed::DELTA);
            let distance = from
                .world_position()
                .distance(to.world_position())
                .clamp(Fixed::ZERO, max_distance);
            let t = distance / max_distance;
            timings.min_flight_time + (timings.max_flight_time - timings.min_flight_time) * t
        }
        AttackType::Laser => timings.laser_sweep_time + timings.laser_hold_time,
        AttackType::Blast | AttackType::Melee => timings.close_attack_time,
    }
}

/// An attack waiting to land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAttack {
    unit: UnitId,
    target: HexCoord,
    elapsed: Fixed,
    duration: Fixed,
}

impl PendingAttack {
    /// Attack by `unit` on `target` landing after `duration` seconds.
    #[must_use]
    pub const fn new(unit: UnitId, target: HexCoord, duration: Fixed) -> Self {
        Self {
            unit,
            target,
            elapsed: Fixed::ZERO,
            duration,
        }
    }

    /// Attacker.
    #[must_use]
    pub const fn unit(&self) -> UnitId {
        self.unit
    }

    /// Target tile.
    #[must_use]
    pub const fn target(&self) -> HexCoord {
        self.target
    }

    /// Advance by `dt` seconds. Returns true once the attack lands.
    pub fn advance(&mut self, dt: Fixed) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt.max(Fixed::ZERO));
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projectile_time_grows_with_distance() {
        let timings = AttackTimings::default();
        let origin = HexCoord::new(0, 0);

        let point_blank = attack_duration(AttackType::Shoot, origin, origin, &timings);
        assert_eq!(point_blank, timings.min_flight_time);

        let near = attack_duration(AttackType::Shoot, origin, HexCoord::new(4, 0), &timings);
        let far = attack_duration(AttackType::Artillery, origin, HexCoord::new(20, 0), &timings);
        assert!(near > point_blank);
        assert!(far > near);

        let beyond = attack_duration(AttackType::Shoot, origin, HexCoord::new(90, 0), &timings);
        assert_eq!(beyond, timings.max_flight_time);
    }

    #[test]
    fn test_laser_and_close_attacks_ignore_distance() {
        let timings = AttackTimings::default();
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(30, 0);
        assert_eq!(
            attack_duration(AttackType::Laser, a, b, &timings),
            timings.laser_sweep_time + timings.laser_hold_time
        );
        assert_eq!(
            attack_duration(AttackType::Melee, a, b, &timings),
            timings.close_attack_time
        );
    }

    #[test]
    fn test_pending_attack_lands_after_duration() {
        let mut attack = PendingAttack::new(UnitId(1), HexCoord::new(2, 0), Fixed::ONE);
        assert!(!attack.advance(Fixed::from_num(0.5)));
        assert!(attack.advance(Fixed::from_num(0.5)));
    }
}
