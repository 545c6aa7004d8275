//! Player and enemy phase alternation.
//!
//! During the enemy phase a FIFO queue, snapshotted when the phase starts,
//! hands control to one enemy at a time. [`TurnOrder`] is bookkeeping only;
//! the battle decides when a turn starts and ends.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::units::UnitId;

/// Which side is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// The human player selects and commands characters.
    #[default]
    Player,
    /// Enemies act one after another.
    Enemy,
}

/// Turn queue and phase counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOrder {
    phase: Phase,
    queue: VecDeque<UnitId>,
    active: Option<UnitId>,
    round: u32,
    enqueued: u32,
    completed: u32,
}

impl Default for TurnOrder {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnOrder {
    /// Start in the player phase of round 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: Phase::Player,
            queue: VecDeque::new(),
            active: None,
            round: 1,
            enqueued: 0,
            completed: 0,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Round number, starting at 1 and counting player phases.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Enemy currently taking its turn.
    #[must_use]
    pub const fn active(&self) -> Option<UnitId> {
        self.active
    }

    /// Enemies still waiting this phase.
    pub fn queued(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.queue.iter().copied()
    }

    /// Enemies enqueued when the current or last enemy phase began.
    #[must_use]
    pub const fn enqueued(&self) -> u32 {
        self.enqueued
    }

    /// Enemy turns finished in the current or last enemy phase.
    #[must_use]
    pub const fn completed(&self) -> u32 {
        self.completed
    }

    /// Enter the enemy phase with a snapshot of enemies to act.
    pub(crate) fn begin_enemy_phase(&mut self, enemies: impl IntoIterator<Item = UnitId>) {
        self.phase = Phase::Enemy;
        self.queue = enemies.into_iter().collect();
        self.active = None;
        self.enqueued = u32::try_from(self.queue.len()).unwrap_or(u32::MAX);
        self.completed = 0;
    }

    /// Hand the turn to the next queued enemy.
    pub(crate) fn start_next(&mut self) -> Option<UnitId> {
        debug_assert!(self.active.is_none(), "enemy turns must not overlap");
        self.active = self.queue.pop_front();
        self.active
    }

    /// Close the active enemy's turn. Returns the unit whose turn ended.
    pub(crate) fn finish_active(&mut self) -> Option<UnitId> {
        let finished = self.active.take();
        if finished.is_some() {
            self.completed += 1;
        }
        finished
    }

    /// Returns true when no enemy is acting or waiting.
    #[must_use]
    pub fn enemy_phase_done(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    /// Enter the player phase of the next round.
    pub(crate) fn begin_player_phase(&mut self) {
        self.phase = Phase::Player;
        self.queue.clear();
        self.active = None;
        self.round += 1;
    }
}
