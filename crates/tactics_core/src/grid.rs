//! Hex grid topology, terrain and occupancy.
//!
//! The grid owns static facts (which tiles exist, their terrain and
//! terrain cost, linked-tile edges) and the live occupancy of each tile.
//! It holds no search state: pathfinding and range queries keep their
//! scratch data in search-local maps.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::GridLayout;
use crate::error::{GameError, Result};
use crate::hex::HexCoord;
use crate::math::Vec2Fixed;
use crate::units::{Faction, UnitId};

/// Highest terrain cost a tile may be given through
/// [`HexGrid::set_terrain_cost`] or a scenario layout.
pub const MAX_TERRAIN_COST: u32 = 999;

/// Terrain classification of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    /// A hole in the map. Not walkable, does not block sight.
    Impassable,
    /// Normal ground.
    #[default]
    Standard,
    /// Solid wall. Not walkable and blocks line of sight.
    Wall,
}

impl Terrain {
    /// Returns true if units may stand on or path through this terrain.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Standard)
    }

    /// Returns true if this terrain is part of the wall layer.
    #[must_use]
    pub const fn blocks_sight(self) -> bool {
        matches!(self, Self::Wall)
    }
}

/// The unit standing on a tile, with its faction for occupancy filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occupant {
    /// Occupying unit.
    pub unit: UnitId,
    /// Faction of the occupying unit.
    pub faction: Faction,
}

/// A single hex tile.
#[derive(Debug, Clone)]
pub struct Tile {
    coord: HexCoord,
    terrain: Terrain,
    terrain_cost: u32,
    linked: Option<HexCoord>,
    occupant: Option<Occupant>,
    reserved_by: Option<UnitId>,
    neighbors: OnceCell<Vec<HexCoord>>,
}

impl Tile {
    fn new(coord: HexCoord, terrain: Terrain, terrain_cost: u32) -> Self {
        Self {
            coord,
            terrain,
            terrain_cost,
            linked: None,
            occupant: None,
            reserved_by: None,
            neighbors: OnceCell::new(),
        }
    }

    /// Coordinate identity of this tile.
    #[must_use]
    pub const fn coord(&self) -> HexCoord {
        self.coord
    }

    /// Terrain classification.
    #[must_use]
    pub const fn terrain(&self) -> Terrain {
        self.terrain
    }

    /// Additive path cost for entering this tile.
    #[must_use]
    pub const fn terrain_cost(&self) -> u32 {
        self.terrain_cost
    }

    /// Returns true if the terrain is walkable.
    #[must_use]
    pub const fn is_walkable(&self) -> bool {
        self.terrain.is_walkable()
    }

    /// Tile reachable from this one outside normal adjacency (ladder, teleporter).
    #[must_use]
    pub const fn linked(&self) -> Option<HexCoord> {
        self.linked
    }

    /// The unit standing here, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<Occupant> {
        self.occupant
    }

    /// Returns true if a unit stands here.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Unit currently moving onto this tile.
    #[must_use]
    pub const fn reserved_by(&self) -> Option<UnitId> {
        self.reserved_by
    }

    /// Occupied, or promised to a unit still in transit.
    #[must_use]
    pub const fn is_claimed(&self) -> bool {
        self.occupant.is_some() || self.reserved_by.is_some()
    }
}

/// The battlefield: a set of hex tiles keyed by coordinate.
#[derive(Debug, Clone, Default)]
pub struct HexGrid {
    tiles: BTreeMap<HexCoord, Tile>,
}

impl HexGrid {
    /// Create an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parallelogram of Standard tiles with zero terrain cost.
    ///
    /// Covers `q` in `0..width` and `r` in `0..height`.
    #[must_use]
    pub fn parallelogram(width: u32, height: u32) -> Self {
        let mut grid = Self::new();
        for r in 0..height as i32 {
            for q in 0..width as i32 {
                grid.insert_tile(HexCoord::new(q, r), Terrain::Standard, 0);
            }
        }
        grid
    }

    /// Build a grid from a data-driven layout.
    pub fn from_layout(layout: &GridLayout) -> Result<Self> {
        if layout.default_terrain_cost > MAX_TERRAIN_COST {
            return Err(GameError::InvalidData(vec![format!(
                "default terrain cost {} exceeds {MAX_TERRAIN_COST}",
                layout.default_terrain_cost
            )]));
        }
        let mut grid = Self::new();
        for r in 0..layout.height as i32 {
            for q in 0..layout.width as i32 {
                grid.insert_tile(
                    HexCoord::new(q, r),
                    Terrain::Standard,
                    layout.default_terrain_cost,
                );
            }
        }

        for tile in &layout.tiles {
            grid.set_terrain(tile.coord, tile.terrain)?;
            if let Some(cost) = tile.cost {
                grid.set_terrain_cost(tile.coord, cost)?;
            }
        }

        for &(a, b) in &layout.links {
            grid.link_tiles(a, b)?;
        }

        Ok(grid)
    }

    /// Add or replace a tile.
    ///
    /// Replacing a tile resets its occupancy and link, and drops every
    /// cached neighbour list since adjacency may have changed.
    pub fn insert_tile(&mut self, coord: HexCoord, terrain: Terrain, terrain_cost: u32) {
        self.tiles
            .insert(coord, Tile::new(coord, terrain, terrain_cost));
        self.invalidate_neighbor_cache();
    }

    fn invalidate_neighbor_cache(&mut self) {
        for tile in self.tiles.values_mut() {
            tile.neighbors.take();
        }
    }

    /// Number of tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Returns true if any tile carries a link.
    #[must_use]
    pub fn has_links(&self) -> bool {
        self.tiles.values().any(|t| t.linked.is_some())
    }

    /// Returns true if the grid has no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Returns true if `coord` names a tile.
    #[must_use]
    pub fn contains(&self, coord: HexCoord) -> bool {
        self.tiles.contains_key(&coord)
    }

    /// Look up a tile.
    pub fn tile(&self, coord: HexCoord) -> Result<&Tile> {
        self.tiles
            .get(&coord)
            .ok_or(GameError::TileNotFound(coord))
    }

    fn tile_mut(&mut self, coord: HexCoord) -> Result<&mut Tile> {
        self.tiles
            .get_mut(&coord)
            .ok_or(GameError::TileNotFound(coord))
    }

    /// All tiles in row-major coordinate order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = HexCoord> + '_ {
        self.tiles.keys().copied()
    }

    /// Neighbours of a tile: existing hex-adjacent tiles, then the linked tile.
    ///
    /// Computed once per tile and cached until the topology changes.
    pub fn neighbors_of(&self, coord: HexCoord) -> Result<&[HexCoord]> {
        let tile = self.tile(coord)?;
        let neighbors = tile.neighbors.get_or_init(|| {
            let mut found: Vec<HexCoord> = coord
                .neighbors()
                .into_iter()
                .filter(|c| self.tiles.contains_key(c))
                .collect();
            if let Some(linked) = tile.linked {
                if !found.contains(&linked) {
                    found.push(linked);
                }
            }
            found
        });
        Ok(neighbors.as_slice())
    }

    /// Returns true if the tile's terrain is walkable.
    pub fn is_walkable(&self, coord: HexCoord) -> Result<bool> {
        Ok(self.tile(coord)?.is_walkable())
    }

    /// Returns true if a unit stands on the tile.
    pub fn is_occupied(&self, coord: HexCoord) -> Result<bool> {
        Ok(self.tile(coord)?.is_occupied())
    }

    /// The unit standing on the tile, if any.
    pub fn occupant(&self, coord: HexCoord) -> Result<Option<Occupant>> {
        Ok(self.tile(coord)?.occupant)
    }

    /// Additive path cost for entering the tile.
    pub fn terrain_cost(&self, coord: HexCoord) -> Result<u32> {
        Ok(self.tile(coord)?.terrain_cost)
    }

    /// Centre of the tile in world space.
    pub fn world_position(&self, coord: HexCoord) -> Result<Vec2Fixed> {
        self.tile(coord).map(|t| t.coord.world_position())
    }

    /// Change a tile's terrain.
    ///
    /// An occupied or reserved tile can only be set to walkable terrain.
    pub fn set_terrain(&mut self, coord: HexCoord, terrain: Terrain) -> Result<()> {
        let tile = self.tile_mut(coord)?;
        if tile.is_claimed() && !terrain.is_walkable() {
            return Err(GameError::InvalidState(format!(
                "cannot make occupied tile {coord} {terrain:?}"
            )));
        }
        tile.terrain = terrain;
        Ok(())
    }

    /// Change a tile's terrain cost, at most [`MAX_TERRAIN_COST`].
    pub fn set_terrain_cost(&mut self, coord: HexCoord, cost: u32) -> Result<()> {
        if cost > MAX_TERRAIN_COST {
            return Err(GameError::InvalidData(vec![format!(
                "terrain cost {cost} at {coord} exceeds {MAX_TERRAIN_COST}"
            )]));
        }
        self.tile_mut(coord)?.terrain_cost = cost;
        Ok(())
    }

    /// Connect two tiles with a two-way link outside hex adjacency.
    ///
    /// Each tile holds at most one link; linking again replaces it.
    pub fn link_tiles(&mut self, a: HexCoord, b: HexCoord) -> Result<()> {
        if a == b {
            return Err(GameError::InvalidState(format!("cannot link {a} to itself")));
        }
        self.tile(a)?;
        self.tile(b)?;

        for coord in [a, b] {
            let previous = self.tile(coord)?.linked;
            if let Some(old) = previous {
                if let Ok(old_tile) = self.tile_mut(old) {
                    if old_tile.linked == Some(coord) {
                        old_tile.linked = None;
                    }
                }
            }
        }

        self.tile_mut(a)?.linked = Some(b);
        self.tile_mut(b)?.linked = Some(a);
        self.invalidate_neighbor_cache();
        Ok(())
    }

    /// Put a unit on a tile.
    ///
    /// Fails if the tile is unknown, unwalkable, held by another unit, or
    /// reserved for a different unit.
    pub fn set_occupant(&mut self, coord: HexCoord, occupant: Occupant) -> Result<()> {
        let tile = self.tile_mut(coord)?;
        if !tile.is_walkable() {
            return Err(GameError::InvariantViolation(format!(
                "unit {} placed on unwalkable tile {coord}",
                occupant.unit
            )));
        }
        if let Some(existing) = tile.occupant {
            if existing.unit != occupant.unit {
                return Err(GameError::InvariantViolation(format!(
                    "tile {coord} already holds unit {}, cannot place unit {}",
                    existing.unit, occupant.unit
                )));
            }
        }
        if let Some(reserved) = tile.reserved_by {
            if reserved != occupant.unit {
                return Err(GameError::InvariantViolation(format!(
                    "tile {coord} is reserved for unit {reserved}, cannot place unit {}",
                    occupant.unit
                )));
            }
            tile.reserved_by = None;
        }
        tile.occupant = Some(occupant);
        Ok(())
    }

    /// Remove a unit from its tile.
    pub fn clear_occupant(&mut self, coord: HexCoord, unit: UnitId) -> Result<()> {
        let tile = self.tile_mut(coord)?;
        match tile.occupant {
            Some(existing) if existing.unit == unit => {
                tile.occupant = None;
                Ok(())
            }
            other => Err(GameError::InvariantViolation(format!(
                "unit {unit} is not on tile {coord} (occupant: {:?})",
                other.map(|o| o.unit)
            ))),
        }
    }

    /// Hold an unclaimed tile for a unit that is on its way there.
    pub fn reserve(&mut self, coord: HexCoord, unit: UnitId) -> Result<()> {
        let tile = self.tile_mut(coord)?;
        if tile.is_claimed() {
            return Err(GameError::InvariantViolation(format!(
                "tile {coord} is already claimed, cannot reserve for unit {unit}"
            )));
        }
        tile.reserved_by = Some(unit);
        Ok(())
    }

    /// Drop a reservation held by `unit`, if any.
    pub fn release(&mut self, coord: HexCoord, unit: UnitId) -> Result<()> {
        let tile = self.tile_mut(coord)?;
        if tile.reserved_by == Some(unit) {
            tile.reserved_by = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupant(id: u32, faction: Faction) -> Occupant {
        Occupant {
            unit: UnitId(id),
            faction,
        }
    }

    #[test]
    fn test_terrain_walkability() {
        assert!(Terrain::Standard.is_walkable());
        assert!(!Terrain::Wall.is_walkable());
        assert!(!Terrain::Impassable.is_walkable());
        assert!(Terrain::Wall.blocks_sight());
        assert!(!Terrain::Impassable.blocks_sight());
    }

    #[test]
    fn test_parallelogram_size() {
        let grid = HexGrid::parallelogram(7, 5);
        assert_eq!(grid.len(), 35);
        assert!(grid.contains(HexCoord::new(6, 4)));
        assert!(!grid.contains(HexCoord::new(7, 0)));
    }

    #[test]
    fn test_unknown_tile_is_not_found() {
        let grid = HexGrid::parallelogram(3, 3);
        let missing = HexCoord::new(-1, 0);
        assert_eq!(grid.tile(missing).unwrap_err(), GameError::TileNotFound(missing));
        assert!(grid.is_walkable(missing).is_err());
        assert!(grid.neighbors_of(missing).is_err());
    }

    #[test]
    fn test_neighbors_interior_and_corner() {
        let grid = HexGrid::parallelogram(5, 5);
        assert_eq!(grid.neighbors_of(HexCoord::new(2, 2)).unwrap().len(), 6);
        // (0,0) only has (1,0) and (0,1) on a parallelogram
        let corner = grid.neighbors_of(HexCoord::new(0, 0)).unwrap();
        assert_eq!(corner, &[HexCoord::new(1, 0), HexCoord::new(0, 1)]);
    }

    #[test]
    fn test_neighbors_include_unwalkable_tiles() {
        let mut grid = HexGrid::parallelogram(3, 3);
        grid.set_terrain(HexCoord::new(2, 1), Terrain::Wall).unwrap();
        let neighbors = grid.neighbors_of(HexCoord::new(1, 1)).unwrap();
        assert!(neighbors.contains(&HexCoord::new(2, 1)));
    }

    #[test]
    fn test_linked_tiles_are_neighbors_and_cache_is_refreshed() {
        let mut grid = HexGrid::parallelogram(6, 1);
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(5, 0);
        assert_eq!(grid.neighbors_of(a).unwrap().len(), 1);

        grid.link_tiles(a, b).unwrap();
        assert!(grid.neighbors_of(a).unwrap().contains(&b));
        assert!(grid.neighbors_of(b).unwrap().contains(&a));
        assert_eq!(grid.tile(a).unwrap().linked(), Some(b));
    }

    #[test]
    fn test_relinking_clears_old_partner() {
        let mut grid = HexGrid::parallelogram(6, 1);
        let a = HexCoord::new(0, 0);
        grid.link_tiles(a, HexCoord::new(5, 0)).unwrap();
        grid.link_tiles(a, HexCoord::new(3, 0)).unwrap();
        assert_eq!(grid.tile(HexCoord::new(5, 0)).unwrap().linked(), None);
        assert_eq!(grid.tile(a).unwrap().linked(), Some(HexCoord::new(3, 0)));
    }

    #[test]
    fn test_occupancy_is_exclusive() {
        let mut grid = HexGrid::parallelogram(3, 3);
        let c = HexCoord::new(1, 1);
        grid.set_occupant(c, occupant(1, Faction::Player)).unwrap();
        assert!(grid.is_occupied(c).unwrap());

        let err = grid.set_occupant(c, occupant(2, Faction::Enemy)).unwrap_err();
        assert!(matches!(err, GameError::InvariantViolation(_)));

        assert!(grid.clear_occupant(c, UnitId(2)).is_err());
        grid.clear_occupant(c, UnitId(1)).unwrap();
        assert!(!grid.is_occupied(c).unwrap());
    }

    #[test]
    fn test_cannot_occupy_wall() {
        let mut grid = HexGrid::parallelogram(3, 3);
        let c = HexCoord::new(1, 1);
        grid.set_terrain(c, Terrain::Wall).unwrap();
        assert!(grid.set_occupant(c, occupant(1, Faction::Player)).is_err());
    }

    #[test]
    fn test_reservation_blocks_other_units() {
        let mut grid = HexGrid::parallelogram(3, 3);
        let c = HexCoord::new(2, 2);
        grid.reserve(c, UnitId(7)).unwrap();
        assert!(grid.tile(c).unwrap().is_claimed());
        assert!(!grid.is_occupied(c).unwrap());
        assert!(grid.reserve(c, UnitId(8)).is_err());
        assert!(grid.set_occupant(c, occupant(8, Faction::Enemy)).is_err());

        grid.set_occupant(c, occupant(7, Faction::Enemy)).unwrap();
        assert_eq!(grid.tile(c).unwrap().reserved_by(), None);
    }

    #[test]
    fn test_cannot_wall_an_occupied_tile() {
        let mut grid = HexGrid::parallelogram(3, 3);
        let c = HexCoord::new(0, 0);
        grid.set_occupant(c, occupant(1, Faction::Player)).unwrap();
        assert!(grid.set_terrain(c, Terrain::Wall).is_err());
        grid.set_terrain(c, Terrain::Standard).unwrap();
    }
}
