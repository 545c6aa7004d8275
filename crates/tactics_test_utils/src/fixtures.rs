//! Test fixtures and helpers.
//!
//! Grids drawn as text, unit definitions with sensible defaults, and
//! helpers that drive a battle until it settles.

use fixed::types::I32F32;
use tactics_core::battle::Battle;
use tactics_core::data::{BattleConfig, UnitData, WeaponData};
use tactics_core::grid::{HexGrid, Terrain};
use tactics_core::hex::HexCoord;
use tactics_core::turns::Phase;
use tactics_core::units::AttackType;

/// Tick length used by [`settle`]: a quarter second.
pub const SETTLE_DT: f64 = 0.25;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Shorthand for an axial coordinate.
#[must_use]
pub const fn hex(q: i32, r: i32) -> HexCoord {
    HexCoord::new(q, r)
}

/// Weapon with the given type, range and damage.
#[must_use]
pub fn weapon(attack_type: AttackType, range: u32, base_damage: u32) -> WeaponData {
    WeaponData {
        attack_type,
        range,
        base_damage,
    }
}

/// A plain soldier: 6 health, no shield, 3 moves, one action point and a
/// range-3 rifle dealing 2 damage.
#[must_use]
pub fn unit_data(id: &str) -> UnitData {
    UnitData {
        id: id.to_string(),
        name: id.to_string(),
        max_shield: 0,
        starting_shield: 0,
        max_health: 6,
        starting_health: 6,
        max_move: 3,
        move_speed: fixed(2),
        max_action_points: 1,
        starting_action_points: 1,
        weapon: weapon(AttackType::Shoot, 3, 2),
    }
}

/// [`unit_data`] with a different move range.
#[must_use]
pub fn unit_with_move(id: &str, max_move: u32) -> UnitData {
    UnitData {
        max_move,
        ..unit_data(id)
    }
}

/// [`unit_data`] with a different weapon.
#[must_use]
pub fn unit_with_weapon(id: &str, attack_type: AttackType, range: u32) -> UnitData {
    UnitData {
        weapon: weapon(attack_type, range, 2),
        ..unit_data(id)
    }
}

/// Build a grid from rows of text, one character per tile.
///
/// Row index is `r`, column index is `q`. `.` is standard ground with no
/// terrain cost, `1`-`9` standard ground with that cost, `#` a wall and
/// `x` impassable. Spaces are ignored so rows can be indented.
///
/// # Panics
///
/// Panics on any other character.
#[must_use]
pub fn grid_from_rows(rows: &[&str]) -> HexGrid {
    let mut grid = HexGrid::new();
    for (r, row) in rows.iter().enumerate() {
        let tiles = row.chars().filter(|ch| !ch.is_whitespace());
        for (q, ch) in tiles.enumerate() {
            let coord = hex(to_i32(q), to_i32(r));
            let (terrain, cost) = match ch {
                '.' => (Terrain::Standard, 0),
                '#' => (Terrain::Wall, 0),
                'x' => (Terrain::Impassable, 0),
                digit @ '1'..='9' => (Terrain::Standard, digit.to_digit(10).unwrap_or(0)),
                other => panic!("unknown tile character {other:?} at ({q}, {r})"),
            };
            grid.insert_tile(coord, terrain, cost);
        }
    }
    grid
}

fn to_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Empty battle on an open `width` by `height` grid.
#[must_use]
pub fn open_battle(width: u32, height: u32) -> Battle {
    Battle::new(HexGrid::parallelogram(width, height), BattleConfig::default())
}

/// Tick until no move or attack is in flight and the player has control.
///
/// Returns the number of ticks taken.
///
/// # Panics
///
/// Panics if the battle has not settled after `max_ticks`.
pub fn settle(battle: &mut Battle, max_ticks: usize) -> usize {
    let dt = fixed_f(SETTLE_DT);
    for ticks in 0..max_ticks {
        if !battle.is_busy() && battle.phase() == Phase::Player {
            return ticks;
        }
        if let Err(err) = battle.tick(dt) {
            panic!("tick {ticks} failed: {err}");
        }
    }
    panic!("battle did not settle within {max_ticks} ticks");
}

/// End the player phase and run the enemy phase to completion.
///
/// # Panics
///
/// Panics if the end of turn is refused or the battle fails to settle.
pub fn run_enemy_phase(battle: &mut Battle) {
    match battle.request_end_turn() {
        Ok(outcome) => assert!(outcome.is_accepted(), "end turn refused: {outcome:?}"),
        Err(err) => panic!("end turn failed: {err}"),
    }
    settle(battle, 10_000);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_from_rows_reads_symbols() {
        let grid = grid_from_rows(&["..#", " 3x."]);
        assert_eq!(grid.len(), 7);
        assert_eq!(grid.tile(hex(2, 0)).unwrap().terrain(), Terrain::Wall);
        assert_eq!(grid.terrain_cost(hex(0, 1)).unwrap(), 3);
        assert!(!grid.is_walkable(hex(1, 1)).unwrap());
        assert!(grid.is_walkable(hex(2, 1)).unwrap());
    }

    #[test]
    fn test_unit_data_is_valid() {
        assert!(unit_data("grunt").validate().is_empty());
        assert_eq!(unit_with_move("runner", 7).max_move, 7);
    }
}
