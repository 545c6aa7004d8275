//! Slow reference searches for checking the real ones.
//!
//! Both oracles relax every edge of the grid until nothing changes, so they
//! consider every route regardless of visiting order. Quadratic in grid
//! size; keep test grids small.

use std::collections::BTreeMap;

use tactics_core::grid::{HexGrid, Tile};
use tactics_core::hex::HexCoord;
use tactics_core::pathfinding::TILE_DISTANCE;
use tactics_core::units::Faction;

/// Cheapest route cost from `origin` to `destination`, or `None`.
///
/// Uses the same rules as A*: stepping into a tile costs its terrain cost
/// plus [`TILE_DISTANCE`], unwalkable tiles are never entered, and tiles
/// held by `blocking` are skipped except for the destination when
/// `allow_occupied_destination` is set.
#[must_use]
pub fn min_route_cost(
    grid: &HexGrid,
    origin: HexCoord,
    destination: HexCoord,
    blocking: Option<Faction>,
    allow_occupied_destination: bool,
) -> Option<u32> {
    let enterable = |tile: &Tile| {
        if !tile.is_walkable() {
            return false;
        }
        let blocked = blocking
            .zip(tile.occupant())
            .is_some_and(|(faction, occupant)| occupant.faction == faction);
        !blocked || (allow_occupied_destination && tile.coord() == destination)
    };
    let costs = relax(grid, origin, enterable, |tile| {
        tile.terrain_cost().saturating_add(TILE_DISTANCE)
    });
    costs.get(&destination).copied()
}

/// Hop distance from `origin` to every tile reachable through tiles that
/// satisfy `enterable`. The origin maps to 0.
#[must_use]
pub fn hop_distances(
    grid: &HexGrid,
    origin: HexCoord,
    enterable: impl Fn(&Tile) -> bool,
) -> BTreeMap<HexCoord, u32> {
    relax(grid, origin, enterable, |_| 1)
}

fn relax(
    grid: &HexGrid,
    origin: HexCoord,
    enterable: impl Fn(&Tile) -> bool,
    step_cost: impl Fn(&Tile) -> u32,
) -> BTreeMap<HexCoord, u32> {
    let mut best: BTreeMap<HexCoord, u32> = BTreeMap::new();
    if !grid.contains(origin) {
        return best;
    }
    best.insert(origin, 0);

    let mut changed = true;
    while changed {
        changed = false;
        for tile in grid.tiles() {
            let Some(&from_cost) = best.get(&tile.coord()) else {
                continue;
            };
            let Ok(neighbors) = grid.neighbors_of(tile.coord()) else {
                continue;
            };
            for &neighbor in neighbors {
                let Ok(next) = grid.tile(neighbor) else {
                    continue;
                };
                if neighbor == origin || !enterable(next) {
                    continue;
                }
                let cost = from_cost.saturating_add(step_cost(next));
                if best.get(&neighbor).map_or(true, |&known| cost < known) {
                    best.insert(neighbor, cost);
                    changed = true;
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{grid_from_rows, hex};

    #[test]
    fn test_route_cost_prefers_cheap_detour() {
        let grid = grid_from_rows(&[".9.", "..."]);
        // Straight through the 9 costs 11; around costs 3.
        assert_eq!(min_route_cost(&grid, hex(0, 0), hex(2, 0), None, false), Some(3));
    }

    #[test]
    fn test_route_cost_none_when_walled_off() {
        let grid = grid_from_rows(&[".#."]);
        assert_eq!(min_route_cost(&grid, hex(0, 0), hex(2, 0), None, false), None);
    }

    #[test]
    fn test_hop_distances_count_rings() {
        let grid = grid_from_rows(&["....."]);
        let hops = hop_distances(&grid, hex(0, 0), |_| true);
        assert_eq!(hops.get(&hex(4, 0)), Some(&4));
        assert_eq!(hops.get(&hex(0, 0)), Some(&0));
    }
}
