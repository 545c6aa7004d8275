//! The battle: one simulation context owning the grid, units and turns.
//!
//! All state lives in [`Battle`]. Hosts call the interaction methods
//! (`select_unit`, `request_move`, ...) in response to input, call
//! [`Battle::tick`] at a fixed rate, and drain [`BattleEvent`]s to drive
//! presentation.
//!
//! # Determinism
//!
//! - Positions and timings use fixed-point math
//! - Units are processed in ascending id order
//! - Searches break ties by coordinate
//!
//! # Example
//!
//! ```
//! use tactics_core::prelude::*;
//!
//! let mut battle = Battle::new(HexGrid::parallelogram(7, 7), BattleConfig::default());
//! let data: UnitData = ron::from_str(
//!     r#"(id: "scout", name: "Scout", max_health: 5, starting_health: 5, max_move: 3, move_speed: 2.0)"#,
//! ).unwrap();
//! let scout = battle.spawn_unit(Faction::Player, &data, HexCoord::new(0, 0)).unwrap();
//!
//! battle.select_unit(HexCoord::new(0, 0)).unwrap();
//! assert!(battle.request_move(HexCoord::new(0, 3)).unwrap().is_accepted());
//!
//! while battle.unit(scout).unwrap().state() == UnitState::Moving {
//!     battle.tick(Fixed::from_num(0.25)).unwrap();
//! }
//! assert_eq!(battle.unit(scout).unwrap().tile(), HexCoord::new(0, 3));
//! assert_eq!(battle.unit(scout).unwrap().move_range(), 0);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::ai::{self, EndTurnReason, TurnPlan};
use crate::attack::{attack_duration, PendingAttack};
use crate::data::{BattleConfig, Scenario, UnitData};
use crate::error::{GameError, Result};
use crate::events::BattleEvent;
use crate::grid::{HexGrid, Occupant};
use crate::hex::HexCoord;
use crate::interface::{HighlightKind, HudSink, NullSink, TileHighlighter};
use crate::math::Fixed;
use crate::movement::{MoveProcess, MoveProgress};
use crate::pathfinding::{find_path, Path, PathOptions};
use crate::rangefinder::{tiles_in_range, RangeFilter, TileRange};
use crate::sight::has_line_of_sight;
use crate::turns::{Phase, TurnOrder};
use crate::units::{DamageReport, Faction, Unit, UnitId, UnitRoster, UnitState};

/// Why a request was refused without changing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Player input is disabled during the enemy phase.
    InteractionDisabled,
    /// It is not the player phase.
    NotPlayerPhase,
    /// No unit is selected.
    NothingSelected,
    /// No unit stands on the tile.
    NoUnitThere,
    /// The unit is not a player character.
    NotAPlayerUnit,
    /// The unit is moving or attacking.
    UnitBusy,
    /// The selected unit is not planning the requested action.
    NotPlanning,
    /// The path does not start on the unit's tile.
    PathNotFromUnit,
    /// The path has no hops.
    EmptyPath,
    /// Consecutive path tiles are not neighbours.
    DisconnectedPath,
    /// The path is longer than the remaining move range.
    OutOfMoveRange,
    /// The destination cannot be stood on.
    DestinationUnwalkable,
    /// The destination is occupied or reserved.
    DestinationClaimed,
    /// No path leads to the destination.
    NoPath,
    /// No action points left.
    NoActionPoints,
    /// The target tile cannot be stood on.
    TargetUnwalkable,
    /// The target tile is outside the attackable set.
    TargetOutOfReach,
}

/// Result of a request that may be refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionOutcome {
    /// The request took effect.
    Accepted,
    /// Nothing changed.
    Rejected(RejectReason),
}

impl ActionOutcome {
    /// Returns true if the request took effect.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// What an enemy does once its move lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterMove {
    Reevaluate,
    EndTurn,
}

/// A battle in progress.
pub struct Battle {
    grid: HexGrid,
    roster: UnitRoster,
    turns: TurnOrder,
    config: BattleConfig,
    selected: Option<UnitId>,
    can_interact: bool,
    /// Range shown to a planning unit.
    ranges: BTreeMap<UnitId, TileRange>,
    moves: BTreeMap<UnitId, MoveProcess>,
    attacks: BTreeMap<UnitId, PendingAttack>,
    after_move: BTreeMap<UnitId, AfterMove>,
    events: Vec<BattleEvent>,
    highlighter: Box<dyn TileHighlighter>,
    hud: Box<dyn HudSink>,
}

impl fmt::Debug for Battle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Battle")
            .field("grid", &self.grid)
            .field("roster", &self.roster)
            .field("turns", &self.turns)
            .field("selected", &self.selected)
            .field("can_interact", &self.can_interact)
            .field("moves", &self.moves)
            .field("attacks", &self.attacks)
            .finish_non_exhaustive()
    }
}

impl Battle {
    /// Create a battle on `grid` with no units, in the player phase of round 1.
    #[must_use]
    pub fn new(grid: HexGrid, config: BattleConfig) -> Self {
        Self {
            grid,
            roster: UnitRoster::new(),
            turns: TurnOrder::new(),
            config,
            selected: None,
            can_interact: true,
            ranges: BTreeMap::new(),
            moves: BTreeMap::new(),
            attacks: BTreeMap::new(),
            after_move: BTreeMap::new(),
            events: Vec::new(),
            highlighter: Box::new(NullSink),
            hud: Box::new(NullSink),
        }
    }

    /// Build a battle from a validated scenario.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidData` listing every validation problem.
    pub fn from_scenario(scenario: &Scenario) -> Result<Self> {
        let errors = scenario.validate();
        if !errors.is_empty() {
            return Err(GameError::InvalidData(errors));
        }

        let grid = HexGrid::from_layout(&scenario.layout)?;
        let mut battle = Self::new(grid, scenario.config);
        for placement in &scenario.units {
            let data = scenario.unit_type(&placement.unit).ok_or_else(|| {
                GameError::InvalidData(vec![format!("unknown unit '{}'", placement.unit)])
            })?;
            battle.spawn_unit(placement.faction, data, placement.coord)?;
        }

        tracing::info!(
            scenario = %scenario.name,
            units = battle.roster.len(),
            tiles = battle.grid.len(),
            "Battle created"
        );
        Ok(battle)
    }

    /// Replace the highlight sink.
    pub fn set_highlighter(&mut self, highlighter: Box<dyn TileHighlighter>) {
        self.highlighter = highlighter;
    }

    /// Replace the HUD sink.
    pub fn set_hud(&mut self, hud: Box<dyn HudSink>) {
        self.hud = hud;
    }

    /// Create a unit from data and place it on `coord`.
    pub fn spawn_unit(&mut self, faction: Faction, data: &UnitData, coord: HexCoord) -> Result<UnitId> {
        let id = self.roster.allocate_id();
        self.grid.set_occupant(coord, Occupant { unit: id, faction })?;
        self.roster.insert(Unit::from_data(id, faction, data, coord));
        tracing::debug!(unit = %id, ?faction, %coord, name = %data.name, "Unit spawned");
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The battlefield.
    #[must_use]
    pub const fn grid(&self) -> &HexGrid {
        &self.grid
    }

    /// Mutable battlefield, for editor-style terrain changes between turns.
    pub fn grid_mut(&mut self) -> &mut HexGrid {
        &mut self.grid
    }

    /// All units.
    #[must_use]
    pub const fn roster(&self) -> &UnitRoster {
        &self.roster
    }

    /// Look up a unit.
    pub fn unit(&self, id: UnitId) -> Result<&Unit> {
        self.roster.get(id)
    }

    /// Phase, queue and counters.
    #[must_use]
    pub const fn turns(&self) -> &TurnOrder {
        &self.turns
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.turns.phase()
    }

    /// Tuning in effect.
    #[must_use]
    pub const fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Selected player character.
    #[must_use]
    pub const fn selected(&self) -> Option<UnitId> {
        self.selected
    }

    /// Returns false while the enemy phase runs.
    #[must_use]
    pub const fn can_interact(&self) -> bool {
        self.can_interact
    }

    /// Movement or attack range shown for a planning unit.
    #[must_use]
    pub fn planned_range(&self, id: UnitId) -> Option<&TileRange> {
        self.ranges.get(&id)
    }

    /// Returns true while any move or attack is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        !self.moves.is_empty() || !self.attacks.is_empty()
    }

    /// Attack waiting to land for `id`, if any.
    #[must_use]
    pub fn pending_attack(&self, id: UnitId) -> Option<&PendingAttack> {
        self.attacks.get(&id)
    }

    /// Take every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Hash of unit and turn state, stable across identical runs.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for unit in self.roster.iter() {
            unit.hash(&mut hasher);
        }
        self.turns.phase().hash(&mut hasher);
        self.turns.round().hash(&mut hasher);
        self.turns.active().hash(&mut hasher);
        hasher.finish()
    }

    fn path_options(&self, faction: Faction) -> PathOptions {
        PathOptions::default()
            .for_faction(faction)
            .with_heuristic(self.config.heuristic)
    }

    fn living(&self, id: UnitId) -> Result<&Unit> {
        let unit = self.roster.get(id)?;
        if !unit.is_alive() {
            return Err(GameError::InvalidState(format!("unit {id} is dead")));
        }
        Ok(unit)
    }

    // ------------------------------------------------------------------
    // Unit state machine
    // ------------------------------------------------------------------

    /// Fail with a logged error unless `id` may move to `next`.
    fn ensure_transition(&self, id: UnitId, next: UnitState, action: &'static str) -> Result<()> {
        let unit = self.living(id)?;
        if unit.state().can_transition(next, unit.faction()) {
            return Ok(());
        }
        tracing::error!(unit = %id, state = ?unit.state(), action, "Illegal state transition");
        Err(GameError::InvalidTransition {
            unit: id,
            state: unit.state(),
            action,
        })
    }

    /// Fail with a logged error unless `id` is Idle.
    fn ensure_idle(&self, id: UnitId, action: &'static str) -> Result<()> {
        let unit = self.living(id)?;
        if unit.state() == UnitState::Idle {
            return Ok(());
        }
        tracing::error!(unit = %id, state = ?unit.state(), action, "Planning requested from a non-idle unit");
        Err(GameError::InvalidTransition {
            unit: id,
            state: unit.state(),
            action,
        })
    }

    fn transition(&mut self, id: UnitId, next: UnitState, action: &'static str) -> Result<()> {
        self.ensure_transition(id, next, action)?;
        let unit = self.roster.get_mut(id)?;
        let from = unit.state();
        unit.transition(next, action)?;
        self.events.push(BattleEvent::StateChanged {
            unit: id,
            from,
            to: next,
        });
        Ok(())
    }

    fn clear_range(&mut self, id: UnitId) {
        if let Some(range) = self.ranges.remove(&id) {
            for coord in range.coords() {
                self.highlighter.clear_highlight(coord);
            }
        }
    }

    fn show_range(&mut self, id: UnitId, range: TileRange, kind: HighlightKind) {
        for coord in range.coords() {
            self.highlighter.highlight(coord, kind);
        }
        self.ranges.insert(id, range);
    }

    fn refresh_hud(&mut self, id: UnitId) -> Result<()> {
        if self.selected == Some(id) {
            let unit = self.roster.get(id)?;
            let (current, max) = (unit.move_range(), unit.stats().max_move_range);
            self.hud.show_move_range(current, max);
        }
        Ok(())
    }

    /// Tiles `id` could walk to with its remaining move range.
    pub fn movement_range(&self, id: UnitId) -> Result<TileRange> {
        let unit = self.living(id)?;
        if unit.move_range() == 0 {
            return Ok(TileRange::empty());
        }
        tiles_in_range(
            &self.grid,
            unit.tile(),
            unit.move_range(),
            RangeFilter::movement(unit.faction()),
        )
    }

    /// Tiles `id` could attack from where it stands.
    ///
    /// Lasers reach every tile. Other weapons reach tiles within weapon
    /// range, walls included, that are in line of sight; artillery skips
    /// the sight check.
    pub fn attackable_tiles(&self, id: UnitId) -> Result<TileRange> {
        let unit = self.living(id)?;
        let weapon = unit.weapon();
        let origin = unit.tile();

        if weapon.attack_type.ignores_range() {
            return Ok(TileRange::whole_grid(&self.grid, origin));
        }

        let mut range = tiles_in_range(&self.grid, origin, weapon.range, RangeFilter::attack())?;
        if !weapon.attack_type.ignores_line_of_sight() {
            let mut hidden = BTreeSet::new();
            for coord in range.coords() {
                if !has_line_of_sight(&self.grid, origin, coord)? {
                    hidden.insert(coord);
                }
            }
            range.retain(|c| !hidden.contains(&c));
        }
        Ok(range)
    }

    /// Enter movement planning and show the reachable tiles.
    ///
    /// With zero move range the state still changes; the range is empty.
    ///
    /// # Errors
    ///
    /// `GameError::InvalidTransition` unless the unit is Idle.
    pub fn start_planning_movement(&mut self, id: UnitId) -> Result<()> {
        self.ensure_idle(id, "plan movement")?;
        let range = self.movement_range(id)?;
        self.transition(id, UnitState::PlanningMovement, "plan movement")?;
        self.show_range(id, range, HighlightKind::MoveArea);
        self.refresh_hud(id)
    }

    /// Enter attack planning and show the attackable tiles.
    ///
    /// With zero action points the state still changes; the set is empty.
    ///
    /// # Errors
    ///
    /// `GameError::InvalidTransition` unless the unit is Idle.
    pub fn start_planning_attack(&mut self, id: UnitId) -> Result<()> {
        self.ensure_idle(id, "plan attack")?;
        let range = if self.living(id)?.action_points() == 0 {
            TileRange::empty()
        } else {
            self.attackable_tiles(id)?
        };
        self.transition(id, UnitState::PlanningAttack, "plan attack")?;
        self.show_range(id, range, HighlightKind::AttackArea);
        Ok(())
    }

    /// Leave movement or attack planning, discarding the shown range.
    pub fn cancel_planning(&mut self, id: UnitId) -> Result<()> {
        let state = self.living(id)?.state();
        if !state.is_planning() {
            return Err(GameError::InvalidTransition {
                unit: id,
                state,
                action: "cancel planning",
            });
        }
        self.transition(id, UnitState::Idle, "cancel planning")?;
        self.clear_range(id);
        Ok(())
    }

    /// Start walking `path`.
    ///
    /// Players must be planning movement; enemies may start from Idle.
    /// Refused without side effects when the path does not start on the
    /// unit, has no hops, is broken, is longer than the move range, or ends
    /// on a claimed or unwalkable tile.
    ///
    /// # Errors
    ///
    /// `GameError::InvalidTransition` when the unit's state forbids moving.
    pub fn start_move(&mut self, id: UnitId, path: Path) -> Result<ActionOutcome> {
        self.ensure_transition(id, UnitState::Moving, "move")?;
        let unit = self.living(id)?;
        let (origin, faction, move_range) = (unit.tile(), unit.faction(), unit.move_range());
        let (speed, penalty) = (unit.stats().move_speed, self.config.terrain_penalty);

        let reject = |reason: RejectReason| {
            tracing::debug!(unit = %id, ?reason, "Move rejected");
            Ok(ActionOutcome::Rejected(reason))
        };

        let Some(destination) = path.destination() else {
            return reject(RejectReason::EmptyPath);
        };
        if path.origin() != Some(origin) {
            return reject(RejectReason::PathNotFromUnit);
        }
        if path.steps() == 0 {
            return reject(RejectReason::EmptyPath);
        }
        if !path.is_connected(&self.grid)? {
            return reject(RejectReason::DisconnectedPath);
        }
        if !path.fits_move_range(move_range) {
            return reject(RejectReason::OutOfMoveRange);
        }
        let tile = self.grid.tile(destination)?;
        if !tile.is_walkable() {
            return reject(RejectReason::DestinationUnwalkable);
        }
        if tile.is_claimed() {
            return reject(RejectReason::DestinationClaimed);
        }

        let process = MoveProcess::new(id, path, &self.grid, speed, penalty)?;
        let steps = process.path().steps();

        self.grid.clear_occupant(origin, id)?;
        self.grid.reserve(destination, id)?;
        self.transition(id, UnitState::Moving, "move")?;
        self.roster.get_mut(id)?.spend_move_range(steps);
        self.clear_range(id);

        tracing::debug!(unit = %id, ?faction, %origin, %destination, steps, "Move started");
        self.events.push(BattleEvent::MoveStarted {
            unit: id,
            path: process.path().tiles().to_vec(),
        });
        self.moves.insert(id, process);
        self.refresh_hud(id)?;
        Ok(ActionOutcome::Accepted)
    }

    /// Commit an attack on `target`.
    ///
    /// Players must be planning an attack and may only hit walkable tiles
    /// in their attackable set; enemies attack straight from Idle.
    ///
    /// # Errors
    ///
    /// `GameError::InvalidTransition` when the unit's state forbids attacking.
    pub fn start_attack(&mut self, id: UnitId, target: HexCoord) -> Result<ActionOutcome> {
        self.ensure_transition(id, UnitState::Attacking, "attack")?;
        let unit = self.living(id)?;
        let (origin, faction, attack_type) = (unit.tile(), unit.faction(), unit.weapon().attack_type);
        let target_tile = self.grid.tile(target)?;

        if unit.action_points() == 0 {
            return Ok(ActionOutcome::Rejected(RejectReason::NoActionPoints));
        }
        if faction == Faction::Player {
            if !target_tile.is_walkable() {
                return Ok(ActionOutcome::Rejected(RejectReason::TargetUnwalkable));
            }
            if !self.attackable_tiles(id)?.contains(target) {
                return Ok(ActionOutcome::Rejected(RejectReason::TargetOutOfReach));
            }
        }

        self.transition(id, UnitState::Attacking, "attack")?;
        self.roster.get_mut(id)?.spend_action_point();
        self.clear_range(id);
        self.highlighter.highlight(target, HighlightKind::AttackTarget);

        let duration = attack_duration(attack_type, origin, target, &self.config.attack_timings);
        self.attacks.insert(id, PendingAttack::new(id, target, duration));

        tracing::debug!(unit = %id, %target, %attack_type, "Attack started");
        self.events.push(BattleEvent::AttackStarted { unit: id, target });
        Ok(ActionOutcome::Accepted)
    }

    /// Land `id`'s pending attack now.
    ///
    /// Whoever occupies the target tile at this moment takes the damage.
    /// Hosts that animate attacks themselves call this instead of relying
    /// on the built-in timeline.
    pub fn resolve_attack(&mut self, id: UnitId) -> Result<()> {
        self.land_attack(id)?;
        self.advance_enemy_phase()
    }

    fn land_attack(&mut self, id: UnitId) -> Result<()> {
        let attack = self
            .attacks
            .remove(&id)
            .ok_or_else(|| GameError::InvalidState(format!("unit {id} has no pending attack")))?;
        let target = attack.target();
        let damage = self.roster.get(id)?.weapon().base_damage;

        self.highlighter.clear_highlight(target);
        let victim = self.grid.occupant(target)?.map(|o| o.unit);
        self.events.push(BattleEvent::AttackResolved {
            unit: id,
            target,
            victim,
        });
        if let Some(victim) = victim {
            self.damage(victim, damage)?;
        }

        if self.roster.get(id)?.is_alive() {
            self.end_attack(id)?;
        }
        Ok(())
    }

    /// Leave the Attacking state once an attack has landed.
    ///
    /// Players keep attacking while action points remain, then fall back
    /// to movement planning while move range remains. Enemies end their turn.
    fn end_attack(&mut self, id: UnitId) -> Result<()> {
        let unit = self.living(id)?;
        let (faction, action_points, move_range) =
            (unit.faction(), unit.action_points(), unit.move_range());
        match faction {
            Faction::Player => {
                if action_points > 0 {
                    self.transition(id, UnitState::PlanningAttack, "end attack")?;
                    let range = self.attackable_tiles(id)?;
                    self.show_range(id, range, HighlightKind::AttackArea);
                } else if move_range > 0 {
                    self.transition(id, UnitState::PlanningMovement, "end attack")?;
                    let range = self.movement_range(id)?;
                    self.show_range(id, range, HighlightKind::MoveArea);
                } else {
                    self.transition(id, UnitState::Idle, "end attack")?;
                }
                self.refresh_hud(id)
            }
            Faction::Enemy => {
                self.transition(id, UnitState::Idle, "end attack")?;
                self.end_enemy_turn(id)
            }
        }
    }

    fn finalize_move(&mut self, id: UnitId, destination: HexCoord) -> Result<()> {
        let faction = self.roster.get(id)?.faction();
        self.grid.set_occupant(destination, Occupant { unit: id, faction })?;
        self.roster.get_mut(id)?.set_tile(destination);
        self.events.push(BattleEvent::MoveFinished {
            unit: id,
            tile: destination,
        });
        tracing::debug!(unit = %id, %destination, "Move finished");

        match faction {
            Faction::Player => {
                let keep_planning =
                    self.selected == Some(id) && self.roster.get(id)?.move_range() > 0;
                if keep_planning {
                    self.transition(id, UnitState::PlanningMovement, "finish move")?;
                    let range = self.movement_range(id)?;
                    self.show_range(id, range, HighlightKind::MoveArea);
                } else {
                    self.transition(id, UnitState::Idle, "finish move")?;
                }
                self.refresh_hud(id)
            }
            Faction::Enemy => {
                self.transition(id, UnitState::Idle, "finish move")?;
                match self.after_move.remove(&id) {
                    Some(AfterMove::Reevaluate) => self.reevaluate(id),
                    Some(AfterMove::EndTurn) | None => self.end_enemy_turn(id),
                }
            }
        }
    }

    /// Reset move range and action points to their maxima.
    pub fn refresh_unit(&mut self, id: UnitId) -> Result<()> {
        self.roster.get_mut(id)?.refresh();
        Ok(())
    }

    /// Grant bonus action points; the total may exceed the maximum.
    pub fn add_action_points(&mut self, id: UnitId, points: u32) -> Result<()> {
        self.living(id)?;
        self.roster.get_mut(id)?.add_action_points(points);
        Ok(())
    }

    /// Restore health up to the maximum. Returns the amount restored.
    pub fn heal(&mut self, id: UnitId, amount: u32) -> Result<u32> {
        let restored = self.roster.get_mut(id)?.heal(amount);
        if restored > 0 {
            self.events.push(BattleEvent::UnitHealed {
                unit: id,
                amount: restored,
            });
        }
        Ok(restored)
    }

    /// Apply damage: shield first, then health. A unit at zero health dies
    /// and leaves the grid.
    pub fn damage(&mut self, id: UnitId, amount: u32) -> Result<DamageReport> {
        let report = self.roster.get_mut(id)?.apply_damage(amount);
        if report.shield_lost > 0 || report.health_lost > 0 {
            self.events.push(BattleEvent::UnitDamaged { unit: id, report });
        }
        if report.killed {
            self.handle_death(id)?;
        }
        Ok(report)
    }

    fn handle_death(&mut self, id: UnitId) -> Result<()> {
        let tile = self.roster.get(id)?.tile();

        if let Some(process) = self.moves.remove(&id) {
            if let Some(destination) = process.destination() {
                self.grid.release(destination, id)?;
            }
        } else {
            self.grid.clear_occupant(tile, id)?;
        }
        if let Some(attack) = self.attacks.remove(&id) {
            self.highlighter.clear_highlight(attack.target());
        }
        self.after_move.remove(&id);
        self.clear_range(id);
        self.roster.get_mut(id)?.force_idle();

        if self.selected == Some(id) {
            self.deselect_unit()?;
        }

        tracing::info!(unit = %id, %tile, "Unit died");
        self.events.push(BattleEvent::UnitDied { unit: id, tile });

        if self.turns.active() == Some(id) {
            self.end_enemy_turn(id)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Advance moves and attacks by `dt` seconds, then let the next enemy act.
    pub fn tick(&mut self, dt: Fixed) -> Result<()> {
        let moving: Vec<UnitId> = self.moves.keys().copied().collect();
        for id in moving {
            let Some(process) = self.moves.get_mut(&id) else {
                continue;
            };
            match process.advance(&self.grid, dt)? {
                MoveProgress::InFlight { position, facing } => {
                    self.roster.get_mut(id)?.set_pose(position, facing);
                }
                MoveProgress::Arrived {
                    destination,
                    facing,
                } => {
                    self.moves.remove(&id);
                    let unit = self.roster.get_mut(id)?;
                    unit.set_pose(destination.world_position(), facing);
                    self.finalize_move(id, destination)?;
                }
            }
        }

        if self.config.builtin_attack_resolution {
            let mut landed = Vec::new();
            for (&id, attack) in &mut self.attacks {
                if attack.advance(dt) {
                    landed.push(id);
                }
            }
            for id in landed {
                if self.attacks.contains_key(&id) {
                    self.land_attack(id)?;
                }
            }
        }

        self.advance_enemy_phase()?;

        if cfg!(feature = "debug-validation") {
            self.check_invariants()?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Turns
    // ------------------------------------------------------------------

    /// Hand control to the enemies.
    ///
    /// Deselects, disables interaction, queues every living enemy in id
    /// order and starts the first turn.
    pub fn start_enemy_phase(&mut self) -> Result<()> {
        self.deselect_unit()?;
        let planning: Vec<UnitId> = self
            .roster
            .iter()
            .filter(|u| u.is_alive() && u.state().is_planning())
            .map(Unit::id)
            .collect();
        for id in planning {
            self.cancel_planning(id)?;
        }

        self.can_interact = false;
        let enemies: Vec<UnitId> = self.roster.alive(Faction::Enemy).map(Unit::id).collect();
        tracing::info!(round = self.turns.round(), enemies = enemies.len(), "Enemy phase");
        self.turns.begin_enemy_phase(enemies);
        self.events.push(BattleEvent::PhaseStarted {
            phase: Phase::Enemy,
            round: self.turns.round(),
        });
        self.advance_enemy_phase()
    }

    /// Refresh every living unit and return control to the player.
    fn start_player_phase(&mut self) -> Result<()> {
        let living: Vec<UnitId> = self
            .roster
            .iter()
            .filter(|u| u.is_alive())
            .map(Unit::id)
            .collect();
        for id in living {
            self.refresh_unit(id)?;
        }

        self.turns.begin_player_phase();
        self.can_interact = true;
        tracing::info!(round = self.turns.round(), "Player phase");
        self.events.push(BattleEvent::PhaseStarted {
            phase: Phase::Player,
            round: self.turns.round(),
        });
        Ok(())
    }

    /// Start queued enemy turns until one is in flight or the queue is empty.
    fn advance_enemy_phase(&mut self) -> Result<()> {
        while self.turns.phase() == Phase::Enemy && self.turns.active().is_none() {
            match self.turns.start_next() {
                Some(id) => self.begin_enemy_turn(id)?,
                None => return self.start_player_phase(),
            }
        }
        Ok(())
    }

    fn begin_enemy_turn(&mut self, id: UnitId) -> Result<()> {
        self.events.push(BattleEvent::EnemyTurnStarted { unit: id });
        if !self.roster.get(id)?.is_alive() {
            return self.end_enemy_turn(id);
        }

        let unit = self.roster.get(id)?;
        let plan = match ai::decide(&self.grid, &self.roster, unit, self.config.heuristic) {
            Ok(plan) => plan,
            Err(err) => {
                tracing::error!(unit = %id, error = %err, "Enemy decision failed");
                TurnPlan::EndTurn {
                    reason: EndTurnReason::NoPath,
                }
            }
        };
        tracing::debug!(unit = %id, ?plan, "Enemy plan");
        self.execute_plan(id, plan)
    }

    fn execute_plan(&mut self, id: UnitId, plan: TurnPlan) -> Result<()> {
        let outcome = match plan {
            TurnPlan::AttackInPlace { target } => self.start_attack(id, target)?,
            TurnPlan::Reposition { path } => {
                self.after_move.insert(id, AfterMove::Reevaluate);
                self.start_move(id, path)?
            }
            TurnPlan::Pursue { path } => {
                self.after_move.insert(id, AfterMove::EndTurn);
                self.start_move(id, path)?
            }
            TurnPlan::EndTurn { reason } => {
                tracing::debug!(unit = %id, ?reason, "Enemy ends turn");
                return self.end_enemy_turn(id);
            }
        };

        if let ActionOutcome::Rejected(reason) = outcome {
            tracing::warn!(unit = %id, ?reason, "Enemy action refused, ending turn");
            self.after_move.remove(&id);
            return self.end_enemy_turn(id);
        }
        Ok(())
    }

    fn reevaluate(&mut self, id: UnitId) -> Result<()> {
        let unit = self.living(id)?;
        let target = ai::strike_target(&self.grid, &self.roster, unit, self.config.heuristic);
        match target {
            Ok(Some(target)) => self.execute_plan(id, TurnPlan::AttackInPlace { target }),
            Ok(None) => self.execute_plan(
                id,
                TurnPlan::EndTurn {
                    reason: EndTurnReason::NoTargetInRange,
                },
            ),
            Err(err) => {
                tracing::error!(unit = %id, error = %err, "Enemy re-evaluation failed");
                self.end_enemy_turn(id)
            }
        }
    }

    fn end_enemy_turn(&mut self, id: UnitId) -> Result<()> {
        if self.turns.active() != Some(id) {
            return Ok(());
        }
        self.turns.finish_active();
        self.events.push(BattleEvent::EnemyTurnEnded { unit: id });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    fn interaction_gate(&self) -> Option<RejectReason> {
        if !self.can_interact {
            return Some(RejectReason::InteractionDisabled);
        }
        if self.turns.phase() != Phase::Player {
            return Some(RejectReason::NotPlayerPhase);
        }
        None
    }

    /// Select the player character on `coord` and show its move range.
    pub fn select_unit(&mut self, coord: HexCoord) -> Result<ActionOutcome> {
        if let Some(reason) = self.interaction_gate() {
            return Ok(ActionOutcome::Rejected(reason));
        }
        let Some(occupant) = self.grid.occupant(coord)? else {
            return Ok(ActionOutcome::Rejected(RejectReason::NoUnitThere));
        };
        if occupant.faction != Faction::Player {
            return Ok(ActionOutcome::Rejected(RejectReason::NotAPlayerUnit));
        }
        if let Some(current) = self.selected {
            if self.roster.get(current)?.state().is_busy() {
                return Ok(ActionOutcome::Rejected(RejectReason::UnitBusy));
            }
        }

        self.deselect_unit()?;
        let id = occupant.unit;
        self.selected = Some(id);
        self.highlighter.highlight(coord, HighlightKind::UnitSelection);
        self.hud.show_attack_panel();
        self.refresh_hud(id)?;
        self.events.push(BattleEvent::UnitSelected { unit: id });

        if self.roster.get(id)?.state() == UnitState::Idle {
            self.start_planning_movement(id)?;
        }
        Ok(ActionOutcome::Accepted)
    }

    /// Clear the selection, cancelling any planning it was doing.
    pub fn deselect_unit(&mut self) -> Result<()> {
        let Some(id) = self.selected.take() else {
            return Ok(());
        };
        if self.roster.get(id)?.state().is_planning() {
            self.cancel_planning(id)?;
        }
        self.highlighter.clear_all();
        self.hud.hide_move_range();
        self.hud.hide_attack_panel();
        self.events.push(BattleEvent::UnitDeselected { unit: id });
        Ok(())
    }

    fn selected_in(&self, state: UnitState) -> Result<std::result::Result<UnitId, RejectReason>> {
        if let Some(reason) = self.interaction_gate() {
            return Ok(Err(reason));
        }
        let Some(id) = self.selected else {
            return Ok(Err(RejectReason::NothingSelected));
        };
        if self.roster.get(id)?.state() != state {
            return Ok(Err(RejectReason::NotPlanning));
        }
        Ok(Ok(id))
    }

    /// Move the selected character to `coord` along the cheapest path.
    pub fn request_move(&mut self, coord: HexCoord) -> Result<ActionOutcome> {
        let id = match self.selected_in(UnitState::PlanningMovement)? {
            Ok(id) => id,
            Err(reason) => return Ok(ActionOutcome::Rejected(reason)),
        };
        let origin = self.roster.get(id)?.tile();
        let options = self.path_options(Faction::Player);
        match find_path(&self.grid, origin, coord, &options)? {
            Some(path) => self.start_move(id, path),
            None => Ok(ActionOutcome::Rejected(RejectReason::NoPath)),
        }
    }

    /// Switch the selected character to attack planning.
    pub fn request_plan_attack(&mut self) -> Result<ActionOutcome> {
        if let Some(reason) = self.interaction_gate() {
            return Ok(ActionOutcome::Rejected(reason));
        }
        let Some(id) = self.selected else {
            return Ok(ActionOutcome::Rejected(RejectReason::NothingSelected));
        };
        match self.roster.get(id)?.state() {
            UnitState::Idle => {}
            UnitState::PlanningMovement => self.cancel_planning(id)?,
            UnitState::PlanningAttack => return Ok(ActionOutcome::Accepted),
            UnitState::Moving | UnitState::Attacking => {
                return Ok(ActionOutcome::Rejected(RejectReason::UnitBusy));
            }
        }
        self.start_planning_attack(id)?;
        self.hud.hide_attack_panel();
        Ok(ActionOutcome::Accepted)
    }

    /// Attack `coord` with the selected character.
    pub fn request_attack(&mut self, coord: HexCoord) -> Result<ActionOutcome> {
        let id = match self.selected_in(UnitState::PlanningAttack)? {
            Ok(id) => id,
            Err(reason) => return Ok(ActionOutcome::Rejected(reason)),
        };
        self.start_attack(id, coord)
    }

    /// End the player phase.
    pub fn request_end_turn(&mut self) -> Result<ActionOutcome> {
        if let Some(reason) = self.interaction_gate() {
            return Ok(ActionOutcome::Rejected(reason));
        }
        if self.is_busy() {
            return Ok(ActionOutcome::Rejected(RejectReason::UnitBusy));
        }
        self.start_enemy_phase()?;
        Ok(ActionOutcome::Accepted)
    }

    /// Highlight the path the selected character would take to `coord`.
    ///
    /// Hops are drawn as valid or invalid depending on move range and
    /// whether the destination is free. Returns the path, if any.
    pub fn preview_path(&mut self, coord: HexCoord) -> Result<Option<Path>> {
        let id = match self.selected_in(UnitState::PlanningMovement)? {
            Ok(id) => id,
            Err(_) => return Ok(None),
        };
        let unit = self.roster.get(id)?;
        let (origin, move_range) = (unit.tile(), unit.move_range());
        let options = self.path_options(Faction::Player);
        let Some(path) = find_path(&self.grid, origin, coord, &options)? else {
            return Ok(None);
        };

        let claimed = self.grid.tile(coord)?.is_claimed() && coord != origin;
        let kind = if !path.fits_move_range(move_range) || claimed {
            HighlightKind::InvalidPath
        } else {
            HighlightKind::ValidPath
        };
        for &tile in path.tiles().iter().skip(1) {
            self.highlighter.highlight(tile, kind);
        }
        self.highlighter.highlight(origin, HighlightKind::UnitSelection);
        Ok(Some(path))
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Verify that grid occupancy and unit positions agree.
    ///
    /// Every living unit that is not moving stands on its tile and nowhere
    /// else; moving units hold a reservation on their destination; dead
    /// units hold nothing.
    pub fn check_invariants(&self) -> Result<()> {
        let violation = |message: String| {
            tracing::error!(%message, "Invariant violated");
            Err(GameError::InvariantViolation(message))
        };

        for tile in self.grid.tiles() {
            if let Some(occupant) = tile.occupant() {
                let unit = self.roster.get(occupant.unit)?;
                if !unit.is_alive() {
                    return violation(format!("dead unit {} occupies {}", unit.id(), tile.coord()));
                }
                if unit.tile() != tile.coord() || unit.faction() != occupant.faction {
                    return violation(format!(
                        "tile {} names unit {} which stands on {}",
                        tile.coord(),
                        unit.id(),
                        unit.tile()
                    ));
                }
                if unit.state() == UnitState::Moving {
                    return violation(format!("moving unit {} still occupies {}", unit.id(), tile.coord()));
                }
            }
        }

        for unit in self.roster.iter().filter(|u| u.is_alive()) {
            if unit.state() == UnitState::Moving {
                let Some(destination) = self.moves.get(&unit.id()).and_then(MoveProcess::destination)
                else {
                    return violation(format!("unit {} is Moving without a path", unit.id()));
                };
                if self.grid.tile(destination)?.reserved_by() != Some(unit.id()) {
                    return violation(format!(
                        "unit {} is moving to unreserved tile {destination}",
                        unit.id()
                    ));
                }
            } else {
                let occupant = self.grid.occupant(unit.tile())?;
                if occupant.map(|o| o.unit) != Some(unit.id()) {
                    return violation(format!(
                        "unit {} is not recorded on its tile {}",
                        unit.id(),
                        unit.tile()
                    ));
                }
            }
        }
        Ok(())
    }
}
