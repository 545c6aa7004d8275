//! Hex-grid pathfinding using the A* algorithm.
//!
//! Step cost into a tile is its terrain cost plus [`TILE_DISTANCE`], so the
//! cheapest path trades detours against rough ground. All scratch state
//! (cost from origin, parents, settled set) lives in maps local to one
//! search; the grid is only read.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::HexGrid;
use crate::hex::HexCoord;
use crate::math::Fixed;
use crate::units::Faction;

/// Per-hop distance term added to every step, equal to the world distance
/// between neighbouring tile centres.
pub const TILE_DISTANCE: u32 = 1;

/// Estimate of remaining cost used to order the open set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Heuristic {
    /// Straight-line world distance to the destination.
    ///
    /// Never overestimates on plain hex adjacency. A linked tile can
    /// shortcut across the map, so searches on a grid with links fall
    /// back to [`Heuristic::Dijkstra`].
    #[default]
    Euclidean,
    /// No estimate: uniform-cost search, always optimal.
    Dijkstra,
}

impl Heuristic {
    /// The heuristic actually used on `grid`: Euclidean estimates are
    /// only admissible without linked tiles.
    #[must_use]
    pub fn admissible_for(self, grid: &HexGrid) -> Self {
        if grid.has_links() {
            Self::Dijkstra
        } else {
            self
        }
    }

    fn estimate(self, from: HexCoord, to: HexCoord) -> Fixed {
        match self {
            Self::Euclidean => from.world_position().distance(to.world_position()),
            Self::Dijkstra => Fixed::ZERO,
        }
    }
}

/// Occupancy policy and tuning for one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathOptions {
    /// Path through tiles held by any unit.
    pub ignore_occupancy: bool,
    /// Faction of the mover. Defaults to the origin tile's occupant; with
    /// neither, occupancy never blocks.
    pub faction: Option<Faction>,
    /// Allow the destination itself to be held by the opposing faction.
    pub allow_occupied_destination: bool,
    /// Open-set ordering estimate.
    pub heuristic: Heuristic,
}

impl PathOptions {
    /// Ignore every occupant.
    #[must_use]
    pub const fn ignoring_occupancy(mut self) -> Self {
        self.ignore_occupancy = true;
        self
    }

    /// Search on behalf of `faction`.
    #[must_use]
    pub const fn for_faction(mut self, faction: Faction) -> Self {
        self.faction = Some(faction);
        self
    }

    /// Let the path end on an opposing unit's tile.
    #[must_use]
    pub const fn allowing_occupied_destination(mut self) -> Self {
        self.allow_occupied_destination = true;
        self
    }

    /// Use a specific heuristic.
    #[must_use]
    pub const fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristic = heuristic;
        self
    }
}

/// An ordered walk from origin to destination, both inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    tiles: Vec<HexCoord>,
}

impl Path {
    /// Wrap a tile sequence.
    ///
    /// Connectivity is not checked here; see [`Path::is_connected`].
    #[must_use]
    pub fn new(tiles: Vec<HexCoord>) -> Self {
        Self { tiles }
    }

    /// All tiles, origin first.
    #[must_use]
    pub fn tiles(&self) -> &[HexCoord] {
        &self.tiles
    }

    /// Number of hops (`len - 1`).
    #[must_use]
    pub fn steps(&self) -> u32 {
        u32::try_from(self.tiles.len().saturating_sub(1)).unwrap_or(u32::MAX)
    }

    /// First tile.
    #[must_use]
    pub fn origin(&self) -> Option<HexCoord> {
        self.tiles.first().copied()
    }

    /// Last tile.
    #[must_use]
    pub fn destination(&self) -> Option<HexCoord> {
        self.tiles.last().copied()
    }

    /// Keep at most `max_steps` hops from the origin.
    #[must_use]
    pub fn truncated(&self, max_steps: u32) -> Self {
        let keep = (max_steps as usize).saturating_add(1).min(self.tiles.len());
        Self {
            tiles: self.tiles[..keep].to_vec(),
        }
    }

    /// Returns true if the path can be walked with `move_range` hops.
    #[must_use]
    pub fn fits_move_range(&self, move_range: u32) -> bool {
        self.steps() <= move_range
    }

    /// Sum of terrain costs of every tile entered (origin excluded).
    pub fn terrain_cost(&self, grid: &HexGrid) -> Result<u32> {
        self.tiles
            .iter()
            .skip(1)
            .try_fold(0u32, |sum, &c| Ok(sum.saturating_add(grid.terrain_cost(c)?)))
    }

    /// Terrain cost plus the per-hop distance term.
    pub fn total_cost(&self, grid: &HexGrid) -> Result<u32> {
        Ok(self
            .terrain_cost(grid)?
            .saturating_add(self.steps().saturating_mul(TILE_DISTANCE)))
    }

    /// Returns true if every consecutive pair are grid neighbours.
    pub fn is_connected(&self, grid: &HexGrid) -> Result<bool> {
        for pair in self.tiles.windows(2) {
            if !grid.neighbors_of(pair[0])?.contains(&pair[1]) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    coord: HexCoord,
    g_score: u32,
    /// `g_score + heuristic`
    f_score: Fixed,
    h_score: Fixed,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so every comparison is reversed.
        // Lower f first, then lower h (closer to the goal), then row-major coordinate.
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.h_score.cmp(&self.h_score))
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the cheapest path between two tiles.
///
/// Skips unwalkable tiles and, unless `options.ignore_occupancy` is set,
/// tiles held by the faction opposing the mover. Returns `Ok(None)` when
/// the destination cannot be reached; that is an ordinary outcome.
///
/// # Errors
///
/// Returns `GameError::TileNotFound` if either endpoint is not on the grid.
pub fn find_path(
    grid: &HexGrid,
    origin: HexCoord,
    destination: HexCoord,
    options: &PathOptions,
) -> Result<Option<Path>> {
    let origin_tile = grid.tile(origin)?;
    grid.tile(destination)?;

    if origin == destination {
        return Ok(Some(Path::new(vec![origin])));
    }

    let blocking_faction = if options.ignore_occupancy {
        None
    } else {
        options
            .faction
            .or_else(|| origin_tile.occupant().map(|o| o.faction))
            .map(Faction::opposing)
    };

    let mut open_set: BinaryHeap<AStarNode> = BinaryHeap::new();
    let mut came_from: HashMap<HexCoord, HexCoord> = HashMap::new();
    let mut g_score: HashMap<HexCoord, u32> = HashMap::new();
    let mut settled: HashSet<HexCoord> = HashSet::new();

    let heuristic = options.heuristic.admissible_for(grid);
    let start_h = heuristic.estimate(origin, destination);
    g_score.insert(origin, 0);
    open_set.push(AStarNode {
        coord: origin,
        g_score: 0,
        f_score: start_h,
        h_score: start_h,
    });

    while let Some(current) = open_set.pop() {
        // Stale entry left behind by a later relaxation
        if !settled.insert(current.coord) {
            continue;
        }

        if current.coord == destination {
            let path = reconstruct_path(&came_from, destination);
            tracing::debug!(
                %origin,
                %destination,
                steps = path.steps(),
                cost = current.g_score,
                settled = settled.len(),
                "Path found"
            );
            return Ok(Some(path));
        }

        for &neighbor in grid.neighbors_of(current.coord)? {
            if settled.contains(&neighbor) {
                continue;
            }

            let tile = grid.tile(neighbor)?;
            if !tile.is_walkable() {
                continue;
            }

            if let (Some(blocking), Some(occupant)) = (blocking_faction, tile.occupant()) {
                let exempt = options.allow_occupied_destination && neighbor == destination;
                if occupant.faction == blocking && !exempt {
                    continue;
                }
            }

            let tentative_g = current
                .g_score
                .saturating_add(tile.terrain_cost())
                .saturating_add(TILE_DISTANCE);

            let improves = g_score
                .get(&neighbor)
                .map_or(true, |&known| tentative_g < known);
            if improves {
                came_from.insert(neighbor, current.coord);
                g_score.insert(neighbor, tentative_g);

                let h = heuristic.estimate(neighbor, destination);
                open_set.push(AStarNode {
                    coord: neighbor,
                    g_score: tentative_g,
                    f_score: Fixed::saturating_from_num(tentative_g).saturating_add(h),
                    h_score: h,
                });
            }
        }
    }

    tracing::debug!(%origin, %destination, settled = settled.len(), "No path");
    Ok(None)
}

/// Reconstruct path from came_from map.
fn reconstruct_path(came_from: &HashMap<HexCoord, HexCoord>, destination: HexCoord) -> Path {
    let mut tiles = vec![destination];
    let mut current = destination;

    while let Some(&prev) = came_from.get(&current) {
        tiles.push(prev);
        current = prev;
    }

    tiles.reverse();
    Path::new(tiles)
}
