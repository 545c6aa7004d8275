//! # Tactics Development Tools
//!
//! Command-line tools for development:
//! - Scenario validators
//! - Headless battle runner (enemy AI against idle characters)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod simulate;
pub mod validate;

use std::path::PathBuf;

use tactics_core::error::GameError;
use thiserror::Error;

/// Errors raised by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file or directory could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The simulation core rejected the input.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Output could not be encoded.
    #[error("cannot encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;
