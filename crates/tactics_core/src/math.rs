//! Fixed-point math utilities for the simulation.
//!
//! World positions, travel timing and straight-line distances all use
//! fixed-point arithmetic so that two runs of the same battle produce the
//! same searches, the same AI choices and the same event log.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// `sqrt(3) / 2`, the vertical spacing between hex rows at unit spacing.
pub const SQRT_3_OVER_2: Fixed = Fixed::from_bits(3_719_550_787);

/// One half.
pub const HALF: Fixed = Fixed::from_bits(1 << 31);

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for fixed-point numbers written as decimal literals.
///
/// Data files are hand-edited, so `move_speed: 0.5` reads better than raw
/// bits. Values are converted once at load time; the simulation itself
/// never touches floats.
pub mod decimal_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| serde::de::Error::custom(format!("{value} is out of fixed-point range")))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Straight-line distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    /// Linearly interpolate between two vectors.
    #[must_use]
    pub fn lerp(self, other: Self, t: Fixed) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len_sq = self.dot(self);

        if len_sq == Fixed::ZERO {
            return Self::ZERO;
        }

        let len = fixed_sqrt(len_sq);
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..48 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epsilon() -> Fixed {
        Fixed::ONE / Fixed::from_num(10_000)
    }

    #[test]
    fn test_distance_pythagorean() {
        let a = Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(0));
        let b = Vec2Fixed::new(Fixed::from_num(0), Fixed::from_num(4));
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
        assert!((a.distance(b) - Fixed::from_num(5)).abs() < epsilon());
    }

    #[test]
    fn test_sqrt_3_over_2_constant() {
        let squared = SQRT_3_OVER_2 * SQRT_3_OVER_2;
        let expected = Fixed::from_num(3) / Fixed::from_num(4);
        assert!((squared - expected).abs() < epsilon());
        assert_eq!(HALF * Fixed::from_num(2), Fixed::ONE);
    }

    #[test]
    fn test_fixed_sqrt_small_values() {
        let quarter = Fixed::ONE / Fixed::from_num(4);
        assert!((fixed_sqrt(quarter) - HALF).abs() < epsilon());
        assert_eq!(fixed_sqrt(Fixed::ZERO), Fixed::ZERO);
        assert_eq!(fixed_sqrt(Fixed::from_num(-4)), Fixed::ZERO);
    }

    #[test]
    fn test_vec2_lerp() {
        let a = Vec2Fixed::ZERO;
        let b = Vec2Fixed::new(Fixed::from_num(10), Fixed::from_num(20));
        let mid = a.lerp(b, HALF);
        assert_eq!(mid, Vec2Fixed::new(Fixed::from_num(5), Fixed::from_num(10)));
    }

    #[test]
    fn test_vec2_normalize() {
        let v = Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(4));
        let norm = v.normalize();
        let len_sq = norm.dot(norm);
        assert!((len_sq - Fixed::ONE).abs() < epsilon());
        assert_eq!(Vec2Fixed::ZERO.normalize(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_decimal_serde_reads_literals() {
        #[derive(Deserialize)]
        struct Speed {
            #[serde(with = "decimal_serde")]
            value: Fixed,
        }

        let parsed: Speed = ron::from_str("(value: 0.5)").unwrap();
        assert_eq!(parsed.value, HALF);
    }
}
