//! # Tactics Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fixture grids, units and a settle-the-battle harness
//! - Exhaustive search oracles
//! - Recording presentation sinks
//! - Determinism harness and property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod oracle;
pub mod recording;

/// Re-export proptest for convenience.
pub use proptest;
