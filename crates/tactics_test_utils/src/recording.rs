//! Presentation sinks that remember what they were told.
//!
//! The battle owns its sinks, so each recorder hands out a shared handle
//! the test keeps for inspection.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tactics_core::hex::HexCoord;
use tactics_core::interface::{HighlightKind, HudSink, TileHighlighter};

/// Current highlight of every marked tile.
#[derive(Debug, Clone, Default)]
pub struct RecordingHighlighter {
    marks: Rc<RefCell<BTreeMap<HexCoord, HighlightKind>>>,
}

impl RecordingHighlighter {
    /// New recorder with no marks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Highlight on `coord`, if any.
    #[must_use]
    pub fn kind_at(&self, coord: HexCoord) -> Option<HighlightKind> {
        self.marks.borrow().get(&coord).copied()
    }

    /// Every tile currently marked `kind`.
    #[must_use]
    pub fn tiles_with(&self, kind: HighlightKind) -> Vec<HexCoord> {
        self.marks
            .borrow()
            .iter()
            .filter(|(_, k)| **k == kind)
            .map(|(&c, _)| c)
            .collect()
    }

    /// Number of marked tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.borrow().len()
    }

    /// Returns true if nothing is marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.borrow().is_empty()
    }
}

impl TileHighlighter for RecordingHighlighter {
    fn highlight(&mut self, coord: HexCoord, kind: HighlightKind) {
        self.marks.borrow_mut().insert(coord, kind);
    }

    fn clear_highlight(&mut self, coord: HexCoord) {
        self.marks.borrow_mut().remove(&coord);
    }

    fn clear_all(&mut self) {
        self.marks.borrow_mut().clear();
    }
}

/// What the HUD is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HudState {
    /// Remaining and maximum move range, when shown.
    pub move_range: Option<(u32, u32)>,
    /// Attack panel visibility.
    pub attack_panel: bool,
}

/// HUD that keeps its latest state.
#[derive(Debug, Clone, Default)]
pub struct RecordingHud {
    state: Rc<RefCell<HudState>>,
}

impl RecordingHud {
    /// New recorder with everything hidden.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the HUD.
    #[must_use]
    pub fn state(&self) -> HudState {
        *self.state.borrow()
    }
}

impl HudSink for RecordingHud {
    fn show_move_range(&mut self, current: u32, max: u32) {
        self.state.borrow_mut().move_range = Some((current, max));
    }

    fn hide_move_range(&mut self) {
        self.state.borrow_mut().move_range = None;
    }

    fn show_attack_panel(&mut self) {
        self.state.borrow_mut().attack_panel = true;
    }

    fn hide_attack_panel(&mut self) {
        self.state.borrow_mut().attack_panel = false;
    }
}
