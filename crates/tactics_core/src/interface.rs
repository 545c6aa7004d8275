//! Presentation sinks.
//!
//! The battle pushes highlight and HUD changes through these traits and
//! never reads anything back. Hosts without a display use [`NullSink`].

use serde::{Deserialize, Serialize};

use crate::hex::HexCoord;

/// Category of a tile highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HighlightKind {
    /// Part of a path the selected unit can walk.
    ValidPath,
    /// Part of a path that is too long or ends on a claimed tile.
    InvalidPath,
    /// Reachable this turn.
    MoveArea,
    /// The selected unit's tile.
    UnitSelection,
    /// Within weapon reach.
    AttackArea,
    /// Tile under the attack cursor.
    AttackTarget,
}

/// Receives tile highlight changes.
pub trait TileHighlighter {
    /// Mark one tile.
    fn highlight(&mut self, coord: HexCoord, kind: HighlightKind);

    /// Remove the mark from one tile.
    fn clear_highlight(&mut self, coord: HexCoord);

    /// Remove every mark.
    fn clear_all(&mut self);
}

/// Receives HUD changes.
pub trait HudSink {
    /// Show the selected unit's remaining and maximum move range.
    fn show_move_range(&mut self, current: u32, max: u32);

    /// Hide the move range readout.
    fn hide_move_range(&mut self);

    /// Show the attack button panel.
    fn show_attack_panel(&mut self);

    /// Hide the attack button panel.
    fn hide_attack_panel(&mut self);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TileHighlighter for NullSink {
    fn highlight(&mut self, _coord: HexCoord, _kind: HighlightKind) {}
    fn clear_highlight(&mut self, _coord: HexCoord) {}
    fn clear_all(&mut self) {}
}

impl HudSink for NullSink {
    fn show_move_range(&mut self, _current: u32, _max: u32) {}
    fn hide_move_range(&mut self) {}
    fn show_attack_panel(&mut self) {}
    fn hide_attack_panel(&mut self) {}
}
