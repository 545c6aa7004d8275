//! Range-limited flood fill over the hex grid.
//!
//! Rings are built outward from an origin: ring 1 is the origin's
//! neighbours, ring `k + 1` the unvisited neighbours of ring `k`. The first
//! ring to reach a tile wins, which matters only when linked tiles create
//! shortcuts.

use std::collections::{BTreeMap, HashSet};

use crate::error::Result;
use crate::grid::{HexGrid, Tile};
use crate::hex::HexCoord;
use crate::units::Faction;

/// Which tiles a range query may enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeFilter {
    /// Enter walls and holes.
    pub include_unwalkable: bool,
    /// Enter tiles held by player characters.
    pub include_players: bool,
    /// Enter tiles held by enemies.
    pub include_enemies: bool,
}

impl Default for RangeFilter {
    fn default() -> Self {
        Self {
            include_unwalkable: false,
            include_players: true,
            include_enemies: true,
        }
    }
}

impl RangeFilter {
    /// Walkable tiles not held by the faction opposing `faction`.
    #[must_use]
    pub fn movement(faction: Faction) -> Self {
        let mut filter = Self::default();
        match faction.opposing() {
            Faction::Player => filter.include_players = false,
            Faction::Enemy => filter.include_enemies = false,
        }
        filter
    }

    /// Every tile, walls included, for weapon reach.
    #[must_use]
    pub fn attack() -> Self {
        Self {
            include_unwalkable: true,
            ..Self::default()
        }
    }

    fn admits(&self, tile: &Tile) -> bool {
        if !self.include_unwalkable && !tile.is_walkable() {
            return false;
        }
        match tile.occupant().map(|o| o.faction) {
            Some(Faction::Player) => self.include_players,
            Some(Faction::Enemy) => self.include_enemies,
            None => true,
        }
    }
}

/// Result of a range query: each reached tile with its ring number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileRange {
    rings: BTreeMap<HexCoord, u32>,
}

impl TileRange {
    /// A range containing nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every tile of the grid except `origin`, ringed by hex distance.
    ///
    /// Used for weapons that ignore range.
    #[must_use]
    pub fn whole_grid(grid: &HexGrid, origin: HexCoord) -> Self {
        let rings = grid
            .coords()
            .filter(|&c| c != origin)
            .map(|c| (c, origin.distance(c)))
            .collect();
        Self { rings }
    }

    /// Number of tiles reached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rings.len()
    }

    /// Returns true if no tile was reached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Returns true if `coord` was reached.
    #[must_use]
    pub fn contains(&self, coord: HexCoord) -> bool {
        self.rings.contains_key(&coord)
    }

    /// Ring in which `coord` was first reached.
    #[must_use]
    pub fn range_from_origin(&self, coord: HexCoord) -> Option<u32> {
        self.rings.get(&coord).copied()
    }

    /// Tiles with their ring, ordered by ring then row-major coordinate.
    #[must_use]
    pub fn ordered(&self) -> Vec<(HexCoord, u32)> {
        let mut entries: Vec<(HexCoord, u32)> = self.rings.iter().map(|(&c, &r)| (c, r)).collect();
        entries.sort_by_key(|&(c, r)| (r, c));
        entries
    }

    /// Tiles in row-major coordinate order.
    pub fn coords(&self) -> impl Iterator<Item = HexCoord> + '_ {
        self.rings.keys().copied()
    }

    /// Keep only tiles for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(HexCoord) -> bool) {
        self.rings.retain(|&c, _| keep(c));
    }
}

/// All tiles within `max_steps` hops of `origin` that pass `filter`.
///
/// The origin is never part of the result, and `max_steps == 0` yields an
/// empty range.
///
/// # Errors
///
/// Returns `GameError::TileNotFound` if `origin` is not on the grid.
pub fn tiles_in_range(
    grid: &HexGrid,
    origin: HexCoord,
    max_steps: u32,
    filter: RangeFilter,
) -> Result<TileRange> {
    grid.tile(origin)?;

    let mut range = TileRange::empty();
    let mut visited: HashSet<HexCoord> = HashSet::new();
    visited.insert(origin);

    let mut frontier = vec![origin];
    for ring in 1..=max_steps {
        let mut next = Vec::new();
        for &coord in &frontier {
            for &neighbor in grid.neighbors_of(coord)? {
                if visited.contains(&neighbor) || !filter.admits(grid.tile(neighbor)?) {
                    continue;
                }
                visited.insert(neighbor);
                range.rings.insert(neighbor, ring);
                next.push(neighbor);
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    tracing::debug!(%origin, max_steps, tiles = range.len(), "Range computed");
    Ok(range)
}
