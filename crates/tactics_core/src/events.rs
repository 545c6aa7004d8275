//! Typed battle events.
//!
//! The battle appends events as things happen; the host drains them once
//! per tick (`Battle::drain_events`) and reacts: animations, sounds, logs.

use serde::{Deserialize, Serialize};

use crate::hex::HexCoord;
use crate::turns::Phase;
use crate::units::{DamageReport, UnitId, UnitState};

/// Something observable that happened during a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// A player character was selected.
    UnitSelected {
        /// Selected unit.
        unit: UnitId,
    },
    /// The selection was cleared.
    UnitDeselected {
        /// Previously selected unit.
        unit: UnitId,
    },
    /// A unit moved along an edge of its state machine.
    StateChanged {
        /// Unit.
        unit: UnitId,
        /// Previous state.
        from: UnitState,
        /// New state.
        to: UnitState,
    },
    /// A unit left its tile along a path.
    MoveStarted {
        /// Moving unit.
        unit: UnitId,
        /// Full path, origin first.
        path: Vec<HexCoord>,
    },
    /// A unit arrived and now occupies its destination.
    MoveFinished {
        /// Unit.
        unit: UnitId,
        /// Destination tile.
        tile: HexCoord,
    },
    /// A unit committed an attack on a tile.
    AttackStarted {
        /// Attacker.
        unit: UnitId,
        /// Target tile.
        target: HexCoord,
    },
    /// An attack landed.
    AttackResolved {
        /// Attacker.
        unit: UnitId,
        /// Target tile.
        target: HexCoord,
        /// Unit standing on the target tile at resolution, if any.
        victim: Option<UnitId>,
    },
    /// A unit lost shield or health.
    UnitDamaged {
        /// Damaged unit.
        unit: UnitId,
        /// What was lost.
        report: DamageReport,
    },
    /// A unit regained health.
    UnitHealed {
        /// Healed unit.
        unit: UnitId,
        /// Health restored.
        amount: u32,
    },
    /// A unit's health reached zero and it left the grid.
    UnitDied {
        /// Dead unit.
        unit: UnitId,
        /// Tile it vacated.
        tile: HexCoord,
    },
    /// A new phase began.
    PhaseStarted {
        /// Phase.
        phase: Phase,
        /// Round number, starting at 1.
        round: u32,
    },
    /// An enemy's turn began.
    EnemyTurnStarted {
        /// Acting enemy.
        unit: UnitId,
    },
    /// An enemy's turn ended.
    EnemyTurnEnded {
        /// Enemy whose turn ended.
        unit: UnitId,
    },
}

impl BattleEvent {
    /// The unit the event is about, if any.
    #[must_use]
    pub const fn unit(&self) -> Option<UnitId> {
        match self {
            Self::UnitSelected { unit }
            | Self::UnitDeselected { unit }
            | Self::StateChanged { unit, .. }
            | Self::MoveStarted { unit, .. }
            | Self::MoveFinished { unit, .. }
            | Self::AttackStarted { unit, .. }
            | Self::AttackResolved { unit, .. }
            | Self::UnitDamaged { unit, .. }
            | Self::UnitHealed { unit, .. }
            | Self::UnitDied { unit, .. }
            | Self::EnemyTurnStarted { unit }
            | Self::EnemyTurnEnded { unit } => Some(*unit),
            Self::PhaseStarted { .. } => None,
        }
    }
}
