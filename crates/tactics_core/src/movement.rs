//! In-flight movement along a path.
//!
//! A [`MoveProcess`] is advanced by the battle tick. Each hop takes
//! `1 / move_speed + terrain_cost * terrain_penalty` seconds; time left
//! over at the end of a hop carries into the next one.

use crate::error::Result;
use crate::grid::HexGrid;
use crate::hex::HexCoord;
use crate::math::{Fixed, Vec2Fixed};
use crate::pathfinding::Path;
use crate::units::UnitId;

/// Result of advancing a move by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveProgress {
    /// Still travelling.
    InFlight {
        /// Interpolated world position.
        position: Vec2Fixed,
        /// Unit direction of the current hop.
        facing: Vec2Fixed,
    },
    /// Reached the last tile of the path.
    Arrived {
        /// Destination tile.
        destination: HexCoord,
        /// Direction of the last hop.
        facing: Vec2Fixed,
    },
}

/// State of one unit's move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveProcess {
    unit: UnitId,
    path: Path,
    /// Index of the tile being left.
    hop: usize,
    elapsed: Fixed,
    hop_duration: Fixed,
    move_speed: Fixed,
    terrain_penalty: Fixed,
}

impl MoveProcess {
    /// Start moving `unit` along `path`, which must have at least one hop.
    pub fn new(
        unit: UnitId,
        path: Path,
        grid: &HexGrid,
        move_speed: Fixed,
        terrain_penalty: Fixed,
    ) -> Result<Self> {
        let mut process = Self {
            unit,
            path,
            hop: 0,
            elapsed: Fixed::ZERO,
            hop_duration: Fixed::ZERO,
            move_speed,
            terrain_penalty,
        };
        process.hop_duration = process.duration_into(grid, 1)?;
        Ok(process)
    }

    /// Moving unit.
    #[must_use]
    pub const fn unit(&self) -> UnitId {
        self.unit
    }

    /// Path being walked.
    #[must_use]
    pub const fn path(&self) -> &Path {
        &self.path
    }

    /// Final tile.
    #[must_use]
    pub fn destination(&self) -> Option<HexCoord> {
        self.path.destination()
    }

    /// Hops completed so far.
    #[must_use]
    pub const fn hops_completed(&self) -> usize {
        self.hop
    }

    /// Seconds needed to enter the tile at `index` of the path.
    fn duration_into(&self, grid: &HexGrid, index: usize) -> Result<Fixed> {
        let Some(&coord) = self.path.tiles().get(index) else {
            return Ok(Fixed::ZERO);
        };
        let base = Fixed::ONE
            .checked_div(self.move_speed)
            .unwrap_or(Fixed::ZERO)
            .max(Fixed::ZERO);
        let terrain = Fixed::saturating_from_num(grid.terrain_cost(coord)?)
            .saturating_mul(self.terrain_penalty);
        Ok(base.saturating_add(terrain.max(Fixed::ZERO)))
    }

    fn facing(&self) -> Vec2Fixed {
        let tiles = self.path.tiles();
        let from = tiles.get(self.hop).copied();
        let to = tiles.get(self.hop + 1).copied();
        match (from, to) {
            (Some(a), Some(b)) => (b.world_position() - a.world_position()).normalize(),
            _ => Vec2Fixed::ZERO,
        }
    }

    /// Advance by `dt` seconds.
    pub fn advance(&mut self, grid: &HexGrid, dt: Fixed) -> Result<MoveProgress> {
        let tiles = self.path.tiles();
        let last = tiles.len().saturating_sub(1);
        self.elapsed = self.elapsed.saturating_add(dt.max(Fixed::ZERO));

        while self.hop < last && self.elapsed >= self.hop_duration {
            self.elapsed -= self.hop_duration;
            self.hop += 1;
            if self.hop < last {
                self.hop_duration = self.duration_into(grid, self.hop + 1)?;
            }
        }

        if self.hop >= last {
            let facing = if last == 0 {
                Vec2Fixed::ZERO
            } else {
                let a = tiles[last - 1].world_position();
                let b = tiles[last].world_position();
                (b - a).normalize()
            };
            return Ok(MoveProgress::Arrived {
                destination: tiles[last],
                facing,
            });
        }

        let from = tiles[self.hop].world_position();
        let to = tiles[self.hop + 1].world_position();
        let t = if self.hop_duration > Fixed::ZERO {
            (self.elapsed / self.hop_duration).min(Fixed::ONE)
        } else {
            Fixed::ONE
        };

        Ok(MoveProgress::InFlight {
            position: from.lerp(to, t),
            facing: self.facing(),
        })
    }
}
