//! Units, their weapons, resources and lifecycle states.
//!
//! A unit is either a player-controlled character or an AI-controlled
//! enemy. Both share the same data and state machine; the faction decides
//! which planning steps apply.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{UnitData, WeaponData};
use crate::error::{GameError, Result};
use crate::hex::HexCoord;
use crate::math::{Fixed, Vec2Fixed};

/// Unique identifier for units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side controls a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// Player-controlled characters.
    Player,
    /// AI-controlled enemies.
    Enemy,
}

impl Faction {
    /// The other side.
    #[must_use]
    pub const fn opposing(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

/// Lifecycle state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitState {
    /// Doing nothing. Initial state and the usual end-of-turn state.
    #[default]
    Idle,
    /// Showing the movement range and waiting for a destination.
    PlanningMovement,
    /// Showing the attack range and waiting for a target.
    PlanningAttack,
    /// Travelling along a path.
    Moving,
    /// Waiting for an attack to resolve.
    Attacking,
}

impl UnitState {
    /// Returns true if `self -> next` is a legal edge for a unit of `faction`.
    ///
    /// Enemy units skip planning, so they may go straight from Idle to
    /// Moving or Attacking.
    #[must_use]
    pub const fn can_transition(self, next: Self, faction: Faction) -> bool {
        use UnitState::{Attacking, Idle, Moving, PlanningAttack, PlanningMovement};

        match (self, next) {
            (Idle, PlanningMovement | PlanningAttack) => true,
            (PlanningMovement, Idle | Moving) => true,
            (PlanningAttack, Idle | Attacking) => true,
            (Moving, Idle | PlanningMovement) => true,
            (Attacking, Idle | PlanningAttack | PlanningMovement) => true,
            (Idle, Moving | Attacking) => matches!(faction, Faction::Enemy),
            _ => false,
        }
    }

    /// Returns true while a range is shown and no action is committed.
    #[must_use]
    pub const fn is_planning(self) -> bool {
        matches!(self, Self::PlanningMovement | Self::PlanningAttack)
    }

    /// Returns true while a move or attack is in flight.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Moving | Self::Attacking)
    }
}

/// How a weapon reaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackType {
    /// Straight-line projectile.
    #[default]
    Shoot,
    /// Beam that reaches any tile regardless of distance or walls.
    Laser,
    /// Arcing shell that clears walls but respects range.
    Artillery,
    /// Short burst.
    Blast,
    /// Close combat.
    Melee,
}

impl AttackType {
    /// Returns true if walls do not block this attack.
    #[must_use]
    pub const fn ignores_line_of_sight(self) -> bool {
        matches!(self, Self::Artillery)
    }

    /// Returns true if every tile on the grid is in range.
    #[must_use]
    pub const fn ignores_range(self) -> bool {
        matches!(self, Self::Laser)
    }
}

impl fmt::Display for AttackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Shoot => "shoot",
            Self::Laser => "laser",
            Self::Artillery => "artillery",
            Self::Blast => "blast",
            Self::Melee => "melee",
        };
        f.write_str(name)
    }
}

/// Equipped weapon. Immutable for the unit's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Weapon {
    /// How the weapon reaches targets.
    pub attack_type: AttackType,
    /// Reach in tiles.
    pub range: u32,
    /// Damage per hit.
    pub base_damage: u32,
}

impl From<&WeaponData> for Weapon {
    fn from(data: &WeaponData) -> Self {
        Self {
            attack_type: data.attack_type,
            range: data.range,
            base_damage: data.base_damage,
        }
    }
}

/// Static stats copied from configuration when the unit is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum shield points.
    pub max_shield: u32,
    /// Maximum health points.
    pub max_health: u32,
    /// Tile hops available per turn.
    pub max_move_range: u32,
    /// Hops per second before terrain penalties.
    #[serde(with = "crate::math::fixed_serde")]
    pub move_speed: Fixed,
    /// Attacks available per turn.
    pub max_action_points: u32,
}

/// Damage applied by a single hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DamageReport {
    /// Shield points removed.
    pub shield_lost: u32,
    /// Health points removed.
    pub health_lost: u32,
    /// Health reached zero.
    pub killed: bool,
}

/// A unit on the battlefield.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Unit {
    id: UnitId,
    faction: Faction,
    name: String,
    stats: UnitStats,
    weapon: Weapon,
    shield: u32,
    health: u32,
    move_range: u32,
    action_points: u32,
    tile: HexCoord,
    position: Vec2Fixed,
    facing: Vec2Fixed,
    state: UnitState,
    alive: bool,
}

impl Unit {
    /// Create a unit from configuration, standing on `tile`.
    ///
    /// Starting shield, health and action points are clamped to their
    /// maxima. Move range starts full.
    #[must_use]
    pub fn from_data(id: UnitId, faction: Faction, data: &UnitData, tile: HexCoord) -> Self {
        let stats = UnitStats {
            max_shield: data.max_shield,
            max_health: data.max_health,
            max_move_range: data.max_move,
            move_speed: data.move_speed,
            max_action_points: data.max_action_points,
        };

        Self {
            id,
            faction,
            name: data.name.clone(),
            stats,
            weapon: Weapon::from(&data.weapon),
            shield: data.starting_shield.min(stats.max_shield),
            health: data.starting_health.min(stats.max_health),
            move_range: stats.max_move_range,
            action_points: data.starting_action_points.min(stats.max_action_points),
            tile,
            position: tile.world_position(),
            facing: Vec2Fixed::ZERO,
            state: UnitState::Idle,
            alive: true,
        }
    }

    /// Unit identifier.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Controlling faction.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Display name from configuration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Static stats.
    #[must_use]
    pub const fn stats(&self) -> &UnitStats {
        &self.stats
    }

    /// Equipped weapon.
    #[must_use]
    pub const fn weapon(&self) -> &Weapon {
        &self.weapon
    }

    /// Current shield.
    #[must_use]
    pub const fn shield(&self) -> u32 {
        self.shield
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Hops left this turn.
    #[must_use]
    pub const fn move_range(&self) -> u32 {
        self.move_range
    }

    /// Attacks left this turn.
    #[must_use]
    pub const fn action_points(&self) -> u32 {
        self.action_points
    }

    /// Tile the unit occupies, or the tile it left while moving.
    #[must_use]
    pub const fn tile(&self) -> HexCoord {
        self.tile
    }

    /// Interpolated world position for presentation.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Direction of the last hop, zero until the unit first moves.
    #[must_use]
    pub const fn facing(&self) -> Vec2Fixed {
        self.facing
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> UnitState {
        self.state
    }

    /// Returns false once health has reached zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Move to `next`, rejecting edges the state machine does not have.
    pub(crate) fn transition(&mut self, next: UnitState, action: &'static str) -> Result<()> {
        if !self.state.can_transition(next, self.faction) {
            return Err(GameError::InvalidTransition {
                unit: self.id,
                state: self.state,
                action,
            });
        }
        tracing::debug!(unit = %self.id, from = ?self.state, to = ?next, "Unit state change");
        self.state = next;
        Ok(())
    }

    pub(crate) fn spend_move_range(&mut self, hops: u32) {
        self.move_range = self.move_range.saturating_sub(hops);
    }

    pub(crate) fn spend_action_point(&mut self) {
        self.action_points = self.action_points.saturating_sub(1);
    }

    pub(crate) fn set_tile(&mut self, tile: HexCoord) {
        self.tile = tile;
        self.position = tile.world_position();
    }

    pub(crate) fn set_pose(&mut self, position: Vec2Fixed, facing: Vec2Fixed) {
        self.position = position;
        if facing != Vec2Fixed::ZERO {
            self.facing = facing;
        }
    }

    /// Reset per-turn resources to their maxima.
    ///
    /// Bonus action points above max are discarded.
    pub fn refresh(&mut self) {
        self.move_range = self.stats.max_move_range;
        self.action_points = self.stats.max_action_points;
    }

    /// Grant bonus action points. The total may exceed the maximum.
    pub fn add_action_points(&mut self, points: u32) {
        self.action_points = self.action_points.saturating_add(points);
    }

    /// Apply a hit: shield absorbs first, the overflow reduces health.
    ///
    /// Dead units take no further damage.
    pub fn apply_damage(&mut self, amount: u32) -> DamageReport {
        if !self.alive {
            return DamageReport::default();
        }

        let shield_lost = amount.min(self.shield);
        let overflow = amount - shield_lost;
        let health_lost = overflow.min(self.health);

        self.shield -= shield_lost;
        self.health -= health_lost;

        let killed = self.health == 0;
        if killed {
            self.alive = false;
        }

        DamageReport {
            shield_lost,
            health_lost,
            killed,
        }
    }

    /// Restore health, never above max. Returns the amount restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if !self.alive {
            return 0;
        }
        let before = self.health;
        self.health = self
            .health
            .saturating_add(amount)
            .min(self.stats.max_health)
            .max(before);
        self.health - before
    }

    pub(crate) fn force_idle(&mut self) {
        self.state = UnitState::Idle;
    }
}

/// Storage for all units in a battle.
///
/// Sorted by id so iteration order is stable.
#[derive(Debug, Clone, Default)]
pub struct UnitRoster {
    units: BTreeMap<UnitId, Unit>,
    next_id: u32,
}

impl UnitRoster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Reserve the next identifier.
    pub(crate) fn allocate_id(&mut self) -> UnitId {
        let id = UnitId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    pub(crate) fn insert(&mut self, unit: Unit) {
        self.units.insert(unit.id, unit);
    }

    /// Look up a unit.
    pub fn get(&self, id: UnitId) -> Result<&Unit> {
        self.units.get(&id).ok_or(GameError::UnitNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.units.get_mut(&id).ok_or(GameError::UnitNotFound(id))
    }

    /// Number of units, dead ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if no unit was ever added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// All units in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.values_mut()
    }

    /// Living units of one faction in id order.
    pub fn alive(&self, faction: Faction) -> impl Iterator<Item = &Unit> {
        self.units
            .values()
            .filter(move |u| u.alive && u.faction == faction)
    }
}
