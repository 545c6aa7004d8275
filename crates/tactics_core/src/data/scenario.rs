//! Battle scenario definitions: map layout, unit roster and placements.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::config::BattleConfig;
use super::unit_data::UnitData;
use crate::error::{GameError, Result};
use crate::grid::{Terrain, MAX_TERRAIN_COST};
use crate::hex::HexCoord;
use crate::units::Faction;

/// Terrain or cost change for a single tile of a layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TileOverride {
    /// Tile to change.
    pub coord: HexCoord,
    /// New terrain.
    #[serde(default)]
    pub terrain: Terrain,
    /// New terrain cost, if different from the layout default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<u32>,
}

/// Parallelogram map with per-tile overrides and linked tiles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridLayout {
    /// Tiles along the `q` axis.
    pub width: u32,
    /// Tiles along the `r` axis.
    pub height: u32,
    /// Terrain cost of tiles without an override.
    #[serde(default)]
    pub default_terrain_cost: u32,
    /// Per-tile terrain and cost overrides.
    #[serde(default)]
    pub tiles: Vec<TileOverride>,
    /// Two-way links outside hex adjacency.
    #[serde(default)]
    pub links: Vec<(HexCoord, HexCoord)>,
}

impl GridLayout {
    /// Returns true if `coord` lies inside the parallelogram.
    #[must_use]
    pub fn contains(&self, coord: HexCoord) -> bool {
        coord.q >= 0
            && coord.r >= 0
            && (coord.q as u32) < self.width
            && (coord.r as u32) < self.height
    }

    /// Terrain of `coord` after overrides, or `None` outside the layout.
    #[must_use]
    pub fn terrain_at(&self, coord: HexCoord) -> Option<Terrain> {
        if !self.contains(coord) {
            return None;
        }
        let terrain = self
            .tiles
            .iter()
            .rev()
            .find(|t| t.coord == coord)
            .map_or(Terrain::Standard, |t| t.terrain);
        Some(terrain)
    }

    /// Check that overrides and links stay inside the map.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.width == 0 || self.height == 0 {
            errors.push(format!("Layout is empty ({}x{})", self.width, self.height));
        }

        if self.default_terrain_cost > MAX_TERRAIN_COST {
            errors.push(format!(
                "Default terrain cost {} exceeds {MAX_TERRAIN_COST}",
                self.default_terrain_cost
            ));
        }

        for tile in &self.tiles {
            if !self.contains(tile.coord) {
                errors.push(format!("Tile override {} is outside the layout", tile.coord));
            }
            if let Some(cost) = tile.cost.filter(|&c| c > MAX_TERRAIN_COST) {
                errors.push(format!(
                    "Tile override {} has cost {cost} (max {MAX_TERRAIN_COST})",
                    tile.coord
                ));
            }
        }

        for (a, b) in &self.links {
            if a == b {
                errors.push(format!("Tile {a} is linked to itself"));
            }
            for end in [a, b] {
                if !self.contains(*end) {
                    errors.push(format!("Link end {end} is outside the layout"));
                }
            }
        }

        errors
    }
}

/// A unit to spawn at battle start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitPlacement {
    /// `UnitData::id` to instantiate.
    pub unit: String,
    /// Controlling faction.
    pub faction: Faction,
    /// Starting tile.
    pub coord: HexCoord,
}

/// Complete battle definition.
///
/// # Example RON
///
/// ```ron
/// Scenario(
///     name: "Crossing",
///     layout: GridLayout(width: 7, height: 7, tiles: [
///         TileOverride(coord: (q: 3, r: 3), terrain: Wall),
///     ]),
///     unit_types: [ /* UnitData(...) */ ],
///     units: [
///         UnitPlacement(unit: "ranger", faction: Player, coord: (q: 0, r: 0)),
///         UnitPlacement(unit: "drone", faction: Enemy, coord: (q: 6, r: 6)),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    /// Display name.
    pub name: String,
    /// Map definition.
    pub layout: GridLayout,
    /// Unit definitions referenced by placements.
    pub unit_types: Vec<UnitData>,
    /// Units present at battle start.
    pub units: Vec<UnitPlacement>,
    /// Tuning for search and attack timing.
    #[serde(default)]
    pub config: BattleConfig,
}

impl Scenario {
    /// Parse a scenario from RON text.
    ///
    /// `source_name` labels errors (usually the file name).
    pub fn from_ron_str(source_name: &str, text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::DataParseError {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })
    }

    /// Find a unit definition by id.
    #[must_use]
    pub fn unit_type(&self, id: &str) -> Option<&UnitData> {
        self.unit_types.iter().find(|u| u.id == id)
    }

    /// Validate internal consistency of the scenario.
    ///
    /// Checks for:
    /// - Layout overrides and links inside the map
    /// - Unit definitions with legal values and unique ids
    /// - Placements referencing known units on free walkable tiles
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.layout.validate();
        errors.extend(self.config.validate());

        let mut ids = BTreeSet::new();
        for unit in &self.unit_types {
            if !ids.insert(unit.id.as_str()) {
                errors.push(format!("Duplicate unit id '{}'", unit.id));
            }
            errors.extend(unit.validate());
        }

        let mut taken = BTreeSet::new();
        for placement in &self.units {
            if self.unit_type(&placement.unit).is_none() {
                errors.push(format!("Placement uses unknown unit '{}'", placement.unit));
            }
            match self.layout.terrain_at(placement.coord) {
                None => errors.push(format!(
                    "Unit '{}' placed outside the layout at {}",
                    placement.unit, placement.coord
                )),
                Some(terrain) if !terrain.is_walkable() => errors.push(format!(
                    "Unit '{}' placed on {terrain:?} at {}",
                    placement.unit, placement.coord
                )),
                Some(_) => {}
            }
            if !taken.insert(placement.coord) {
                errors.push(format!("Two units placed on {}", placement.coord));
            }
        }

        errors
    }
}
