//! Enemy decision making.
//!
//! An enemy's turn is decided once when it starts, and once more after a
//! repositioning move lands. Everything here reads the grid and roster and
//! returns a plan; the battle carries it out.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::grid::HexGrid;
use crate::hex::HexCoord;
use crate::math::Fixed;
use crate::pathfinding::{find_path, Heuristic, Path, PathOptions};
use crate::rangefinder::{tiles_in_range, RangeFilter};
use crate::sight::has_line_of_sight;
use crate::units::{Faction, Unit, UnitRoster};

/// Why an enemy ended its turn without acting (further).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndTurnReason {
    /// No living character remains.
    NoCharacters,
    /// The chosen tile cannot be reached at all.
    NoPath,
    /// Nothing is in range and visible from where the unit stands.
    NoTargetInRange,
    /// Movement is exhausted or blocked before the first hop.
    CannotAdvance,
}

/// What an enemy will do this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnPlan {
    /// Attack a character's tile without moving.
    AttackInPlace {
        /// Target tile.
        target: HexCoord,
    },
    /// Move toward an attack position, then re-evaluate.
    Reposition {
        /// Path to walk, already truncated to move range.
        path: Path,
    },
    /// Close distance to the nearest character; no attack this turn.
    Pursue {
        /// Path to walk, already truncated to move range.
        path: Path,
    },
    /// Do nothing more.
    EndTurn {
        /// Logged explanation.
        reason: EndTurnReason,
    },
}

fn living_characters(roster: &UnitRoster) -> Vec<&Unit> {
    roster.alive(Faction::Player).collect()
}

/// Squared world distance between two tiles.
fn distance_key(a: HexCoord, b: HexCoord) -> Fixed {
    a.world_position().distance_squared(b.world_position())
}

/// Characters sorted nearest first; ties by id.
fn by_distance<'a>(characters: &[&'a Unit], from: HexCoord) -> Vec<&'a Unit> {
    let mut sorted = characters.to_vec();
    sorted.sort_by_key(|c| (distance_key(from, c.tile()), c.id()));
    sorted
}

/// Returns true if `unit`, standing on `from`, can hit `target`.
///
/// The unobstructed walking distance (occupancy ignored) must be within
/// weapon range, and the target must be visible unless the weapon is
/// artillery.
pub fn can_strike(
    grid: &HexGrid,
    unit: &Unit,
    from: HexCoord,
    target: HexCoord,
    heuristic: Heuristic,
) -> Result<bool> {
    let weapon = unit.weapon();
    if !weapon.attack_type.ignores_line_of_sight() && !has_line_of_sight(grid, from, target)? {
        return Ok(false);
    }

    let options = PathOptions::default()
        .ignoring_occupancy()
        .with_heuristic(heuristic);
    Ok(find_path(grid, from, target, &options)?
        .is_some_and(|path| path.steps() <= weapon.range))
}

/// Tile of the nearest character `unit` can hit from where it stands.
pub fn strike_target(
    grid: &HexGrid,
    roster: &UnitRoster,
    unit: &Unit,
    heuristic: Heuristic,
) -> Result<Option<HexCoord>> {
    let characters = living_characters(roster);
    for character in by_distance(&characters, unit.tile()) {
        if can_strike(grid, unit, unit.tile(), character.tile(), heuristic)? {
            return Ok(Some(character.tile()));
        }
    }
    Ok(None)
}

/// Tiles from which `unit` could attack some character.
///
/// A candidate is the unit's own tile, or a walkable tile nobody holds or
/// is moving to. Unless the weapon is artillery it must also see the
/// character it was found for (any character, for lasers).
pub fn attack_positions(grid: &HexGrid, roster: &UnitRoster, unit: &Unit) -> Result<BTreeSet<HexCoord>> {
    let characters = living_characters(roster);
    let weapon = unit.weapon();
    let needs_sight = !weapon.attack_type.ignores_line_of_sight();

    let eligible = |coord: HexCoord| -> Result<bool> {
        if coord == unit.tile() {
            return Ok(true);
        }
        let tile = grid.tile(coord)?;
        Ok(tile.is_walkable() && !tile.is_claimed())
    };

    let mut candidates = BTreeSet::new();

    if weapon.attack_type.ignores_range() {
        for coord in grid.coords() {
            if !eligible(coord)? {
                continue;
            }
            let mut visible = !needs_sight;
            for character in &characters {
                if visible {
                    break;
                }
                visible = has_line_of_sight(grid, coord, character.tile())?;
            }
            if visible {
                candidates.insert(coord);
            }
        }
        return Ok(candidates);
    }

    for character in &characters {
        let reach = tiles_in_range(grid, character.tile(), weapon.range, RangeFilter::default())?;
        for coord in reach.coords() {
            if candidates.contains(&coord) || !eligible(coord)? {
                continue;
            }
            if !needs_sight || has_line_of_sight(grid, coord, character.tile())? {
                candidates.insert(coord);
            }
        }
    }

    Ok(candidates)
}

/// The attack position nearest to the unit; ties by coordinate.
pub fn best_move_tile(grid: &HexGrid, roster: &UnitRoster, unit: &Unit) -> Result<Option<HexCoord>> {
    let candidates = attack_positions(grid, roster, unit)?;
    Ok(candidates
        .into_iter()
        .min_by_key(|&c| (distance_key(unit.tile(), c), c)))
}

/// Shorten `path` to the unit's move range and back off claimed tiles.
fn walkable_prefix(grid: &HexGrid, path: &Path, max_steps: u32) -> Result<Path> {
    let mut truncated = path.truncated(max_steps);
    while truncated.steps() > 0 {
        let Some(end) = truncated.destination() else {
            break;
        };
        if !grid.tile(end)?.is_claimed() {
            break;
        }
        truncated = truncated.truncated(truncated.steps() - 1);
    }
    Ok(truncated)
}

fn attack_or_end(
    grid: &HexGrid,
    roster: &UnitRoster,
    unit: &Unit,
    heuristic: Heuristic,
) -> Result<TurnPlan> {
    Ok(match strike_target(grid, roster, unit, heuristic)? {
        Some(target) => TurnPlan::AttackInPlace { target },
        None => TurnPlan::EndTurn {
            reason: EndTurnReason::NoTargetInRange,
        },
    })
}

/// Decide an enemy's turn.
///
/// 1. Find the nearest tile from which some character can be attacked.
/// 2. None: pursue the nearest character, stopping short of its tile.
/// 3. It is the unit's own tile: attack the nearest target in range.
/// 4. Otherwise walk toward it as far as move range allows.
///
/// Unreachable goals end the turn instead of failing.
pub fn decide(
    grid: &HexGrid,
    roster: &UnitRoster,
    unit: &Unit,
    heuristic: Heuristic,
) -> Result<TurnPlan> {
    let characters = living_characters(roster);
    if characters.is_empty() {
        return Ok(TurnPlan::EndTurn {
            reason: EndTurnReason::NoCharacters,
        });
    }

    let origin = unit.tile();
    let options = PathOptions::default()
        .for_faction(unit.faction())
        .with_heuristic(heuristic);

    let Some(best) = best_move_tile(grid, roster, unit)? else {
        let Some(nearest) = by_distance(&characters, origin).first().copied() else {
            return Ok(TurnPlan::EndTurn {
                reason: EndTurnReason::NoCharacters,
            });
        };
        let pursuit = options.allowing_occupied_destination();
        let Some(path) = find_path(grid, origin, nearest.tile(), &pursuit)? else {
            tracing::warn!(unit = %unit.id(), target = %nearest.tile(), "No path to nearest character");
            return Ok(TurnPlan::EndTurn {
                reason: EndTurnReason::NoPath,
            });
        };

        let max_steps = unit.move_range().min(path.steps().saturating_sub(1));
        let path = walkable_prefix(grid, &path, max_steps)?;
        if path.steps() == 0 {
            return Ok(TurnPlan::EndTurn {
                reason: EndTurnReason::CannotAdvance,
            });
        }
        return Ok(TurnPlan::Pursue { path });
    };

    if best == origin {
        return attack_or_end(grid, roster, unit, heuristic);
    }

    let Some(path) = find_path(grid, origin, best, &options)? else {
        tracing::warn!(unit = %unit.id(), target = %best, "No path to attack position");
        return Ok(TurnPlan::EndTurn {
            reason: EndTurnReason::NoPath,
        });
    };

    let path = walkable_prefix(grid, &path, unit.move_range())?;
    if path.steps() == 0 {
        return attack_or_end(grid, roster, unit, heuristic);
    }
    Ok(TurnPlan::Reposition { path })
}
