//! Data structures for battle configuration.
//!
//! This module contains pure data structures that define unit types, map
//! layouts, scenarios and tuning. All structs are designed to be
//! deserialized from RON files.
//!
//! **Note:** This module contains no file IO. Loading from disk is handled
//! by `tactics_tools`.

mod config;
mod scenario;
mod unit_data;

pub use config::{AttackTimings, BattleConfig};
pub use scenario::{GridLayout, Scenario, TileOverride, UnitPlacement};
pub use unit_data::{UnitData, WeaponData, WEAPON_STAT_MAX, WEAPON_STAT_MIN};
