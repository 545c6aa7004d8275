//! # Tactics Core
//!
//! Turn-based hex-grid tactics simulation.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO beyond parsing data handed to it
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! Presentation talks to the simulation through the sinks in [`interface`]
//! and the [`events`] drained from a [`battle::Battle`].
//!
//! ## Crate Structure
//!
//! - [`hex`] / [`grid`] - Axial coordinates and the battlefield
//! - [`rangefinder`] - Hop-distance rings around a tile
//! - [`pathfinding`] - A* over the grid
//! - [`sight`] - Wall-blocked line of sight
//! - [`units`] - Units and their action state machine
//! - [`turns`] - Player/enemy phases
//! - [`ai`] - Enemy decision making
//! - [`battle`] - The simulation context tying it together
//! - [`data`] - RON scenario and unit definitions
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod attack;
pub mod battle;
pub mod data;
pub mod error;
pub mod events;
pub mod grid;
pub mod hex;
pub mod interface;
pub mod math;
pub mod movement;
pub mod pathfinding;
pub mod rangefinder;
pub mod sight;
pub mod turns;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{EndTurnReason, TurnPlan};
    pub use crate::battle::{ActionOutcome, Battle, RejectReason};
    pub use crate::data::{AttackTimings, BattleConfig, GridLayout, Scenario, UnitData, WeaponData};
    pub use crate::error::{GameError, Result};
    pub use crate::events::BattleEvent;
    pub use crate::grid::{HexGrid, Occupant, Terrain, Tile};
    pub use crate::hex::HexCoord;
    pub use crate::interface::{HighlightKind, HudSink, NullSink, TileHighlighter};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::pathfinding::{find_path, Heuristic, Path, PathOptions};
    pub use crate::rangefinder::{tiles_in_range, RangeFilter, TileRange};
    pub use crate::sight::has_line_of_sight;
    pub use crate::turns::{Phase, TurnOrder};
    pub use crate::units::{AttackType, DamageReport, Faction, Unit, UnitId, UnitState};
}
