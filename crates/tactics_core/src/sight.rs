//! Line-of-sight checks against the wall layer.

use crate::error::Result;
use crate::grid::HexGrid;
use crate::hex::HexCoord;

/// Returns true if no wall stands strictly between two tiles.
///
/// The sight line is the hex line between the two centres. The endpoints
/// themselves never block, and coordinates missing from the grid count
/// as open air.
///
/// # Errors
///
/// Returns `GameError::TileNotFound` if either endpoint is not on the grid.
pub fn has_line_of_sight(grid: &HexGrid, from: HexCoord, to: HexCoord) -> Result<bool> {
    grid.tile(from)?;
    grid.tile(to)?;

    let line = from.line_to(to);
    let interior = line.iter().skip(1).take(line.len().saturating_sub(2));
    for &coord in interior {
        if let Ok(tile) = grid.tile(coord) {
            if tile.terrain().blocks_sight() {
                return Ok(false);
            }
        }
    }
    Ok(true)
}
