//! Headless battle runner.
//!
//! Plays a scenario with idle player characters: every player phase is
//! ended immediately and the enemy AI acts. Useful for checking that a map
//! plays out without errors and for eyeballing AI behaviour.

use serde::Serialize;
use tactics_core::battle::Battle;
use tactics_core::data::Scenario;
use tactics_core::events::BattleEvent;
use tactics_core::math::Fixed;
use tactics_core::turns::Phase;
use tactics_core::units::Faction;

use crate::Result;

/// How long to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationOptions {
    /// Enemy phases to play.
    pub rounds: u32,
    /// Seconds per tick.
    pub dt: Fixed,
    /// Give up after this many ticks.
    pub max_ticks: u64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            rounds: 3,
            dt: Fixed::from_num(0.1),
            max_ticks: 100_000,
        }
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationSummary {
    /// Scenario name.
    pub scenario: String,
    /// Enemy phases completed.
    pub rounds_played: u32,
    /// Ticks executed.
    pub ticks: u64,
    /// Living player characters at the end.
    pub players_alive: usize,
    /// Living enemies at the end.
    pub enemies_alive: usize,
    /// Every event, in order.
    pub events: Vec<BattleEvent>,
}

/// Play `options.rounds` enemy phases of `scenario`.
///
/// Stops early when either side is wiped out or the tick limit is hit.
///
/// # Errors
///
/// Returns an error if the scenario is invalid or the battle fails.
pub fn run(scenario: &Scenario, options: SimulationOptions) -> Result<SimulationSummary> {
    let mut battle = Battle::from_scenario(scenario)?;
    let mut events = Vec::new();
    let mut rounds_played = 0;
    let mut ticks = 0;

    while rounds_played < options.rounds && ticks < options.max_ticks {
        if battle.roster().alive(Faction::Player).next().is_none()
            || battle.roster().alive(Faction::Enemy).next().is_none()
        {
            break;
        }

        if battle.can_interact() && !battle.is_busy() {
            battle.request_end_turn()?;
        }
        battle.tick(options.dt)?;
        ticks += 1;

        for event in battle.drain_events() {
            if matches!(
                event,
                BattleEvent::PhaseStarted {
                    phase: Phase::Player,
                    ..
                }
            ) {
                rounds_played += 1;
            }
            events.push(event);
        }
    }

    if ticks >= options.max_ticks {
        tracing::warn!(ticks, rounds_played, "Tick limit reached");
    }

    let summary = SimulationSummary {
        scenario: scenario.name.clone(),
        rounds_played,
        ticks,
        players_alive: battle.roster().alive(Faction::Player).count(),
        enemies_alive: battle.roster().alive(Faction::Enemy).count(),
        events,
    };
    tracing::info!(
        scenario = %summary.scenario,
        rounds = summary.rounds_played,
        ticks = summary.ticks,
        players = summary.players_alive,
        enemies = summary.enemies_alive,
        "Simulation finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKIRMISH: &str = r#"
        Scenario(
            name: "Skirmish",
            layout: GridLayout(width: 6, height: 4),
            unit_types: [
                UnitData(id: "guard", name: "Guard", max_health: 30, starting_health: 30),
                UnitData(
                    id: "raider",
                    name: "Raider",
                    max_health: 4,
                    starting_health: 4,
                    max_move: 2,
                    move_speed: 2.0,
                    weapon: WeaponData(attack_type: shoot, range: 2, base_damage: 1),
                ),
            ],
            units: [
                UnitPlacement(unit: "guard", faction: Player, coord: (q: 0, r: 0)),
                UnitPlacement(unit: "raider", faction: Enemy, coord: (q: 5, r: 3)),
            ],
        )
    "#;

    #[test]
    fn test_enemy_closes_in_and_attacks() {
        let scenario = Scenario::from_ron_str("skirmish.ron", SKIRMISH).unwrap();
        let options = SimulationOptions {
            rounds: 4,
            ..SimulationOptions::default()
        };
        let summary = run(&scenario, options).unwrap();

        assert_eq!(summary.rounds_played, 4);
        assert_eq!(summary.players_alive, 1);
        assert!(summary
            .events
            .iter()
            .any(|e| matches!(e, BattleEvent::MoveStarted { .. })));
        assert!(summary
            .events
            .iter()
            .any(|e| matches!(e, BattleEvent::AttackResolved { .. })));
    }

    #[test]
    fn test_invalid_scenario_is_rejected() {
        let mut scenario = Scenario::from_ron_str("skirmish.ron", SKIRMISH).unwrap();
        scenario.units[1].coord = scenario.units[0].coord;
        assert!(run(&scenario, SimulationOptions::default()).is_err());
    }
}
