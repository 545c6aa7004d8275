//! Battle tuning: search heuristic, travel penalty and attack timings.

use serde::{Deserialize, Serialize};

use crate::math::{decimal_serde, Fixed};
use crate::pathfinding::Heuristic;

/// Durations of the built-in attack resolution, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttackTimings {
    /// Projectile flight time at zero distance.
    #[serde(default = "default_min_flight", with = "decimal_serde")]
    pub min_flight_time: Fixed,

    /// Projectile flight time at `max_flight_distance` or beyond.
    #[serde(default = "default_max_flight", with = "decimal_serde")]
    pub max_flight_time: Fixed,

    /// Distance at which flight time stops growing.
    #[serde(default = "default_max_distance", with = "decimal_serde")]
    pub max_flight_distance: Fixed,

    /// Time for a laser beam to reach its target.
    #[serde(default = "default_laser_sweep", with = "decimal_serde")]
    pub laser_sweep_time: Fixed,

    /// Time a laser beam is held before damage lands.
    #[serde(default = "default_laser_hold", with = "decimal_serde")]
    pub laser_hold_time: Fixed,

    /// Duration of blast and melee attacks.
    #[serde(default = "default_min_flight", with = "decimal_serde")]
    pub close_attack_time: Fixed,
}

fn default_min_flight() -> Fixed {
    Fixed::from_num(0.75)
}

fn default_max_flight() -> Fixed {
    Fixed::from_num(2.5)
}

fn default_max_distance() -> Fixed {
    Fixed::from_num(40)
}

fn default_laser_sweep() -> Fixed {
    Fixed::from_num(0.05)
}

fn default_laser_hold() -> Fixed {
    Fixed::from_num(2)
}

impl Default for AttackTimings {
    fn default() -> Self {
        Self {
            min_flight_time: default_min_flight(),
            max_flight_time: default_max_flight(),
            max_flight_distance: default_max_distance(),
            laser_sweep_time: default_laser_sweep(),
            laser_hold_time: default_laser_hold(),
            close_attack_time: default_min_flight(),
        }
    }
}

/// Battle-wide tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BattleConfig {
    /// A* heuristic. Grids with linked tiles always search with
    /// [`Heuristic::Dijkstra`].
    #[serde(default)]
    pub heuristic: Heuristic,

    /// Extra seconds per point of terrain cost on each hop.
    #[serde(default = "default_terrain_penalty", with = "decimal_serde")]
    pub terrain_penalty: Fixed,

    /// Built-in attack durations.
    #[serde(default)]
    pub attack_timings: AttackTimings,

    /// Resolve attacks with the built-in timeline. When false the host
    /// calls `Battle::resolve_attack` itself.
    #[serde(default = "default_true")]
    pub builtin_attack_resolution: bool,
}

fn default_terrain_penalty() -> Fixed {
    Fixed::from_num(0.5)
}

const fn default_true() -> bool {
    true
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            heuristic: Heuristic::default(),
            terrain_penalty: default_terrain_penalty(),
            attack_timings: AttackTimings::default(),
            builtin_attack_resolution: true,
        }
    }
}

impl BattleConfig {
    /// Check for negative or inverted durations.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let t = &self.attack_timings;

        if self.terrain_penalty < Fixed::ZERO {
            errors.push(format!("Negative terrain penalty {}", self.terrain_penalty));
        }
        for (name, value) in [
            ("min_flight_time", t.min_flight_time),
            ("max_flight_time", t.max_flight_time),
            ("laser_sweep_time", t.laser_sweep_time),
            ("laser_hold_time", t.laser_hold_time),
            ("close_attack_time", t.close_attack_time),
        ] {
            if value < Fixed::ZERO {
                errors.push(format!("Negative attack timing {name} = {value}"));
            }
        }
        if t.max_flight_time < t.min_flight_time {
            errors.push("max_flight_time is shorter than min_flight_time".to_string());
        }
        if t.max_flight_distance <= Fixed::ZERO {
            errors.push(format!(
                "max_flight_distance must be positive, got {}",
                t.max_flight_distance
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: BattleConfig = ron::from_str("()").unwrap();
        assert_eq!(config, BattleConfig::default());
        assert_eq!(config.terrain_penalty, Fixed::from_num(0.5));
        assert_eq!(config.heuristic, Heuristic::Euclidean);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_partial_override() {
        let config: BattleConfig =
            ron::from_str("(heuristic: Dijkstra, attack_timings: (laser_hold_time: 0.5))").unwrap();
        assert_eq!(config.heuristic, Heuristic::Dijkstra);
        assert_eq!(config.attack_timings.laser_hold_time, Fixed::from_num(0.5));
        assert_eq!(config.attack_timings.max_flight_time, Fixed::from_num(2.5));
    }

    #[test]
    fn test_validate_inverted_flight_times() {
        let mut config = BattleConfig::default();
        config.attack_timings.max_flight_time = Fixed::from_num(0.1);
        assert_eq!(config.validate().len(), 1);
    }
}
