//! Axial hex coordinates.
//!
//! Pointy-top hexes addressed by axial `(q, r)`. The implicit third cube
//! coordinate is `s = -q - r`. World positions place neighbour centres
//! exactly one unit apart, so straight-line distances and per-hop costs
//! share a scale.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed, HALF, SQRT_3_OVER_2};

/// Axial offsets of the six neighbours, clockwise from east.
pub const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (0, 1), (-1, 1), (-1, 0), (0, -1), (1, -1)];

/// Axial coordinate of a hex tile.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct HexCoord {
    /// Column axis.
    pub q: i32,
    /// Row axis.
    pub r: i32,
}

impl PartialOrd for HexCoord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HexCoord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Row-major ordering for deterministic iteration
        (self.r, self.q).cmp(&(other.r, other.q))
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

impl HexCoord {
    /// Create a new hex coordinate.
    #[inline]
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third cube coordinate.
    #[inline]
    #[must_use]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    /// All six adjacent coordinates in [`DIRECTIONS`] order.
    ///
    /// Whether they exist on a given grid is the grid's business.
    #[must_use]
    pub fn neighbors(self) -> [HexCoord; 6] {
        DIRECTIONS.map(|(dq, dr)| HexCoord::new(self.q + dq, self.r + dr))
    }

    /// Number of hex steps between two coordinates.
    #[must_use]
    pub fn distance(self, other: HexCoord) -> u32 {
        let dq = (self.q - other.q).unsigned_abs();
        let dr = (self.r - other.r).unsigned_abs();
        let ds = (self.s() - other.s()).unsigned_abs();
        dq.max(dr).max(ds)
    }

    /// Returns true if `other` is one of the six adjacent hexes.
    #[must_use]
    pub fn is_adjacent(self, other: HexCoord) -> bool {
        self.distance(other) == 1
    }

    /// Centre of the hex in world space.
    #[must_use]
    pub fn world_position(self) -> Vec2Fixed {
        let q = Fixed::from_num(self.q);
        let r = Fixed::from_num(self.r);
        Vec2Fixed::new(q + r * HALF, r * SQRT_3_OVER_2)
    }

    /// Hexes crossed by the straight segment between two centres.
    ///
    /// Includes both endpoints. Endpoints are nudged by a tiny cube offset
    /// so a segment running exactly along a hex edge resolves to one side
    /// consistently.
    #[must_use]
    pub fn line_to(self, other: HexCoord) -> Vec<HexCoord> {
        let steps = self.distance(other);
        if steps == 0 {
            return vec![self];
        }

        let nudge = Fixed::from_bits(4_295); // ~1e-6
        let start = (
            Fixed::from_num(self.q) + nudge,
            Fixed::from_num(self.r) + nudge * Fixed::from_num(2),
            Fixed::from_num(self.s()) - nudge * Fixed::from_num(3),
        );
        let end = (
            Fixed::from_num(other.q) + nudge,
            Fixed::from_num(other.r) + nudge * Fixed::from_num(2),
            Fixed::from_num(other.s()) - nudge * Fixed::from_num(3),
        );

        let total = Fixed::from_num(steps);
        (0..=steps)
            .map(|i| {
                let t = Fixed::from_num(i) / total;
                cube_round(
                    start.0 + (end.0 - start.0) * t,
                    start.1 + (end.1 - start.1) * t,
                    start.2 + (end.2 - start.2) * t,
                )
            })
            .collect()
    }
}

/// Round fractional cube coordinates to the containing hex.
fn cube_round(q: Fixed, r: Fixed, s: Fixed) -> HexCoord {
    let mut rq = q.round();
    let mut rr = r.round();
    let rs = s.round();

    let dq = (rq - q).abs();
    let dr = (rr - r).abs();
    let ds = (rs - s).abs();

    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }

    HexCoord::new(rq.to_num::<i32>(), rr.to_num::<i32>())
}
