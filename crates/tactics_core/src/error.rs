//! Error types for the tactics simulation.
//!
//! Only programming errors and bad input data are errors. Searches that
//! find nothing and actions refused for lack of resources are ordinary
//! return values (`Option`, [`ActionOutcome`](crate::battle::ActionOutcome)).

use thiserror::Error;

use crate::hex::HexCoord;
use crate::units::{UnitId, UnitState};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Coordinate does not name a tile of the grid.
    #[error("Tile not found: {0}")]
    TileNotFound(HexCoord),

    /// Invalid unit identifier.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// A unit was asked to perform an action its state does not allow.
    #[error("Unit {unit} cannot {action} while {state:?}")]
    InvalidTransition {
        /// Unit that was asked.
        unit: UnitId,
        /// Its state at the time.
        state: UnitState,
        /// What was requested.
        action: &'static str,
    },

    /// Grid and unit bookkeeping disagree.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// Data file parsing error.
    #[error("Failed to parse data '{source_name}': {message}")]
    DataParseError {
        /// Name of the data source (file name or fixture label).
        source_name: String,
        /// Error message.
        message: String,
    },

    /// Data parsed but failed validation.
    #[error("Invalid data: {}", .0.join("; "))]
    InvalidData(Vec<String>),

    /// Invalid battle state for the requested operation.
    #[error("Invalid battle state: {0}")]
    InvalidState(String),
}
