//! Unit and weapon data structures for data-driven unit definitions.

use serde::{Deserialize, Serialize};

use crate::math::{decimal_serde, Fixed};
use crate::units::AttackType;

/// Lowest legal weapon range and damage.
pub const WEAPON_STAT_MIN: u32 = 1;

/// Highest legal weapon range and damage.
pub const WEAPON_STAT_MAX: u32 = 99;

/// Weapon definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeaponData {
    /// How the weapon reaches its target.
    #[serde(default)]
    pub attack_type: AttackType,

    /// Reach in tiles (1..=99).
    #[serde(default = "default_weapon_range")]
    pub range: u32,

    /// Damage per hit (1..=99).
    #[serde(default = "default_base_damage")]
    pub base_damage: u32,
}

const fn default_weapon_range() -> u32 {
    6
}

const fn default_base_damage() -> u32 {
    4
}

impl Default for WeaponData {
    fn default() -> Self {
        Self {
            attack_type: AttackType::default(),
            range: default_weapon_range(),
            base_damage: default_base_damage(),
        }
    }
}

/// Data-driven unit definition.
///
/// Loaded once before the battle starts and never mutated by the core.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     id: "ranger",
///     name: "Ranger",
///     max_shield: 4,
///     starting_shield: 4,
///     max_health: 10,
///     starting_health: 10,
///     max_move: 5,
///     move_speed: 2.0,
///     max_action_points: 1,
///     starting_action_points: 1,
///     weapon: WeaponData(attack_type: shoot, range: 4, base_damage: 3),
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitData {
    /// Unique string identifier, referenced by scenario placements.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Maximum shield points.
    #[serde(default)]
    pub max_shield: u32,

    /// Shield at creation, clamped to `max_shield`.
    #[serde(default)]
    pub starting_shield: u32,

    /// Maximum health points.
    pub max_health: u32,

    /// Health at creation, clamped to `max_health`.
    pub starting_health: u32,

    /// Tile hops per turn.
    #[serde(default = "default_max_move")]
    pub max_move: u32,

    /// Hops per second before terrain penalties.
    #[serde(default = "default_move_speed", with = "decimal_serde")]
    pub move_speed: Fixed,

    /// Attacks per turn.
    #[serde(default = "default_action_points")]
    pub max_action_points: u32,

    /// Action points at creation, clamped to `max_action_points`.
    #[serde(default = "default_action_points")]
    pub starting_action_points: u32,

    /// Equipped weapon.
    #[serde(default)]
    pub weapon: WeaponData,
}

const fn default_max_move() -> u32 {
    8
}

fn default_move_speed() -> Fixed {
    Fixed::from_num(0.5)
}

const fn default_action_points() -> u32 {
    1
}

impl UnitData {
    /// Check value ranges. Returns a list of problems, empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let weapon_range = WEAPON_STAT_MIN..=WEAPON_STAT_MAX;

        if self.id.is_empty() {
            errors.push(format!("Unit '{}' has an empty id", self.name));
        }
        if self.max_health == 0 {
            errors.push(format!("Unit '{}' has zero max health", self.id));
        }
        if self.starting_health == 0 {
            errors.push(format!("Unit '{}' starts dead", self.id));
        }
        if self.move_speed <= Fixed::ZERO {
            errors.push(format!(
                "Unit '{}' has non-positive move speed {}",
                self.id, self.move_speed
            ));
        }
        if !weapon_range.contains(&self.weapon.range) {
            errors.push(format!(
                "Unit '{}' weapon range {} is outside {WEAPON_STAT_MIN}..={WEAPON_STAT_MAX}",
                self.id, self.weapon.range
            ));
        }
        if !weapon_range.contains(&self.weapon.base_damage) {
            errors.push(format!(
                "Unit '{}' weapon damage {} is outside {WEAPON_STAT_MIN}..={WEAPON_STAT_MAX}",
                self.id, self.weapon.base_damage
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let data: UnitData = ron::from_str(
            r#"(id: "grunt", name: "Grunt", max_health: 6, starting_health: 6)"#,
        )
        .unwrap();

        assert_eq!(data.max_move, 8);
        assert_eq!(data.move_speed, Fixed::from_num(0.5));
        assert_eq!(data.max_action_points, 1);
        assert_eq!(data.weapon, WeaponData::default());
        assert!(data.validate().is_empty());
    }

    #[test]
    fn test_weapon_attack_type_is_lowercase() {
        let weapon: WeaponData =
            ron::from_str("(attack_type: artillery, range: 5, base_damage: 7)").unwrap();
        assert_eq!(weapon.attack_type, AttackType::Artillery);
    }

    #[test]
    fn test_validate_rejects_out_of_range_weapon() {
        let mut data: UnitData = ron::from_str(
            r#"(id: "grunt", name: "Grunt", max_health: 6, starting_health: 6)"#,
        )
        .unwrap();
        data.weapon.range = 0;
        data.weapon.base_damage = 100;
        data.move_speed = Fixed::ZERO;

        let errors = data.validate();
        assert_eq!(errors.len(), 3, "{errors:?}");
    }
}
