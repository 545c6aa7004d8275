//! Property tests for search, unit state and turn order.

use proptest::prelude::*;
use tactics_core::prelude::*;
use tactics_test_utils::determinism::strategies::{arb_grid, arb_grid_with_endpoints, arb_range};
use tactics_test_utils::fixtures::{hex, open_battle, run_enemy_phase, settle, unit_data, unit_with_move};
use tactics_test_utils::oracle::{hop_distances, min_route_cost};

// =============================================================================
// Search
// =============================================================================

proptest! {
    /// A* finds a route exactly as cheap as the exhaustive oracle, with
    /// either heuristic, and only walks walkable neighbours.
    #[test]
    fn prop_path_cost_matches_oracle((layout, origin, destination) in arb_grid_with_endpoints(7)) {
        let grid = layout.build();
        let expected = min_route_cost(&grid, origin, destination, None, false);

        for heuristic in [Heuristic::Euclidean, Heuristic::Dijkstra] {
            let options = PathOptions::default().with_heuristic(heuristic);
            let found = find_path(&grid, origin, destination, &options).unwrap();
            match (&found, expected) {
                (Some(path), Some(cost)) => {
                    prop_assert_eq!(path.total_cost(&grid).unwrap(), cost);
                    prop_assert!(path.is_connected(&grid).unwrap());
                    prop_assert_eq!(path.origin(), Some(origin));
                    prop_assert_eq!(path.destination(), Some(destination));
                    for &tile in path.tiles().iter().skip(1) {
                        prop_assert!(grid.is_walkable(tile).unwrap());
                    }
                }
                (None, None) => {}
                (found, expected) => {
                    prop_assert!(false, "search {:?} disagrees with oracle {:?}", found, expected);
                }
            }
        }
    }

    /// Ring numbers equal hop distance and nothing within range is missed.
    #[test]
    fn prop_range_rings_are_hop_distances(
        (layout, origin, _) in arb_grid_with_endpoints(7),
        max_steps in arb_range(),
    ) {
        let grid = layout.build();

        let cases = [
            (RangeFilter::attack(), hop_distances(&grid, origin, |_| true)),
            (RangeFilter::default(), hop_distances(&grid, origin, |t| t.is_walkable())),
        ];
        for (filter, hops) in cases {
            let range = tiles_in_range(&grid, origin, max_steps, filter).unwrap();
            for (coord, ring) in range.ordered() {
                prop_assert_eq!(hops.get(&coord).copied(), Some(ring));
                prop_assert!(ring <= max_steps);
            }
            for (&coord, &distance) in &hops {
                if coord != origin && distance <= max_steps {
                    prop_assert!(range.contains(coord), "{} at {} missing", coord, distance);
                }
            }
            prop_assert!(!range.contains(origin));
        }
    }

    /// On open ground, ring number is plain hex distance.
    #[test]
    fn prop_open_ground_rings_are_hex_distance(max_steps in 0u32..5) {
        let grid = HexGrid::parallelogram(9, 9);
        let origin = hex(4, 4);
        let range = tiles_in_range(&grid, origin, max_steps, RangeFilter::default()).unwrap();
        for (coord, ring) in range.ordered() {
            prop_assert_eq!(origin.distance(coord), ring);
        }
    }
}

// =============================================================================
// Unit state machine
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    PlanMove,
    PlanAttack,
    Cancel,
    Move(i32, i32),
    Attack(i32, i32),
    Resolve,
    Tick,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::PlanMove),
        Just(Op::PlanAttack),
        Just(Op::Cancel),
        (0i32..5, 0i32..5).prop_map(|(q, r)| Op::Move(q, r)),
        (0i32..5, 0i32..5).prop_map(|(q, r)| Op::Attack(q, r)),
        Just(Op::Resolve),
        Just(Op::Tick),
    ]
}

/// State, move range and action points of a unit.
fn snapshot(battle: &Battle, id: UnitId) -> (UnitState, u32, u32) {
    let unit = battle.unit(id).unwrap();
    (unit.state(), unit.move_range(), unit.action_points())
}

fn apply(battle: &mut Battle, id: UnitId, op: &Op) -> Result<ActionOutcome> {
    match *op {
        Op::PlanMove => battle.start_planning_movement(id).map(|()| ActionOutcome::Accepted),
        Op::PlanAttack => battle.start_planning_attack(id).map(|()| ActionOutcome::Accepted),
        Op::Cancel => battle.cancel_planning(id).map(|()| ActionOutcome::Accepted),
        Op::Move(q, r) => {
            let from = battle.unit(id)?.tile();
            let options = PathOptions::default().for_faction(Faction::Player);
            match find_path(battle.grid(), from, hex(q, r), &options)? {
                Some(path) => battle.start_move(id, path),
                None => Ok(ActionOutcome::Rejected(RejectReason::NoPath)),
            }
        }
        Op::Attack(q, r) => battle.start_attack(id, hex(q, r)),
        Op::Resolve => battle.resolve_attack(id).map(|()| ActionOutcome::Accepted),
        Op::Tick => battle.tick(Fixed::from_num(0.5)).map(|()| ActionOutcome::Accepted),
    }
}

proptest! {
    /// Whatever is asked, a unit only moves along legal edges, and refused
    /// requests leave state and resources untouched.
    #[test]
    fn prop_state_machine_only_takes_legal_edges(ops in proptest::collection::vec(arb_op(), 1..40)) {
        let mut battle = open_battle(5, 5);
        let hero = battle.spawn_unit(Faction::Player, &unit_data("hero"), hex(0, 0)).unwrap();
        battle.spawn_unit(
            Faction::Enemy,
            &UnitData { max_health: 99, starting_health: 99, ..unit_data("dummy") },
            hex(2, 2),
        ).unwrap();

        for op in &ops {
            let before = snapshot(&battle, hero);
            let outcome = apply(&mut battle, hero, op);
            let refused = !matches!(outcome, Ok(ActionOutcome::Accepted));
            if refused && !matches!(op, Op::Tick) {
                prop_assert_eq!(snapshot(&battle, hero), before, "{:?} -> {:?}", op, outcome);
            }

            for event in battle.drain_events() {
                if let BattleEvent::StateChanged { unit, from, to } = event {
                    let faction = battle.unit(unit).unwrap().faction();
                    prop_assert!(from.can_transition(to, faction), "illegal {:?} -> {:?}", from, to);
                }
            }
            battle.check_invariants().unwrap();
        }
    }

    /// A successful move spends exactly its hop count; a move longer than
    /// the remaining range is refused.
    #[test]
    fn prop_move_spends_hops(
        (layout, origin, destination) in arb_grid_with_endpoints(6),
        max_move in 0u32..6,
    ) {
        let mut grid = layout.build();
        grid.set_terrain(origin, Terrain::Standard).unwrap();
        let mut battle = Battle::new(grid, BattleConfig::default());
        let id = battle.spawn_unit(Faction::Player, &unit_with_move("mover", max_move), origin).unwrap();
        battle.start_planning_movement(id).unwrap();

        let options = PathOptions::default().for_faction(Faction::Player);
        let Some(path) = find_path(battle.grid(), origin, destination, &options).unwrap() else {
            return Ok(());
        };
        let steps = path.steps();

        let outcome = battle.start_move(id, path).unwrap();
        let after = battle.unit(id).unwrap().move_range();
        if steps == 0 {
            prop_assert_eq!(outcome, ActionOutcome::Rejected(RejectReason::EmptyPath));
            prop_assert_eq!(after, max_move);
        } else if steps <= max_move {
            prop_assert!(outcome.is_accepted());
            prop_assert_eq!(after, max_move - steps);
            settle(&mut battle, 1_000);
            prop_assert_eq!(battle.unit(id).unwrap().tile(), destination);
        } else {
            prop_assert_eq!(outcome, ActionOutcome::Rejected(RejectReason::OutOfMoveRange));
            prop_assert_eq!(after, max_move);
        }
    }
}

#[test]
fn test_player_attack_from_idle_changes_nothing() {
    let mut battle = open_battle(5, 5);
    let hero = battle.spawn_unit(Faction::Player, &unit_data("hero"), hex(0, 0)).unwrap();
    battle.spawn_unit(Faction::Enemy, &unit_data("foe"), hex(1, 0)).unwrap();

    let before = snapshot(&battle, hero);
    assert!(matches!(
        battle.start_attack(hero, hex(1, 0)),
        Err(GameError::InvalidTransition { .. })
    ));
    assert_eq!(snapshot(&battle, hero), before);
    assert!(battle.drain_events().is_empty());
}

// =============================================================================
// Turn order
// =============================================================================

/// Count enemy turn ends before the player phase resumes.
fn turns_ended_before_player_phase(events: &[BattleEvent]) -> Option<usize> {
    let mut ended = 0;
    for event in events {
        match event {
            BattleEvent::EnemyTurnEnded { .. } => ended += 1,
            BattleEvent::PhaseStarted { phase: Phase::Player, .. } => return Some(ended),
            _ => {}
        }
    }
    None
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Every queued enemy ends its turn exactly once per enemy phase,
    /// whether it attacked, moved or found nothing to do.
    #[test]
    fn prop_every_enemy_ends_its_turn(
        layout in arb_grid(6),
        picks in proptest::collection::vec(any::<proptest::sample::Index>(), 2..7),
        enemy_moves in proptest::collection::vec(0u32..4, 6),
    ) {
        let mut battle = Battle::new(layout.build(), BattleConfig::default());
        let walkable: Vec<HexCoord> = battle
            .grid()
            .tiles()
            .filter(|t| t.is_walkable())
            .map(Tile::coord)
            .collect();
        prop_assume!(walkable.len() >= 2);

        let mut spots: Vec<HexCoord> = picks.iter().map(|i| *i.get(&walkable)).collect();
        spots.sort();
        spots.dedup();
        prop_assume!(spots.len() >= 2);

        battle.spawn_unit(Faction::Player, &unit_data("guard"), spots[0]).unwrap();
        for (n, &spot) in spots.iter().enumerate().skip(1) {
            let data = unit_with_move("raider", enemy_moves[n % enemy_moves.len()]);
            battle.spawn_unit(Faction::Enemy, &data, spot).unwrap();
        }
        let enemies = spots.len() - 1;

        for _ in 0..2 {
            let alive = battle.roster().alive(Faction::Enemy).count();
            run_enemy_phase(&mut battle);
            let events = battle.drain_events();
            prop_assert_eq!(turns_ended_before_player_phase(&events), Some(alive));
            prop_assert_eq!(battle.turns().completed() as usize, alive);
            prop_assert_eq!(alive, enemies);
            battle.check_invariants().unwrap();
        }
    }
}

#[test]
fn test_enemy_phase_with_mixed_outcomes() {
    let mut battle = open_battle(8, 3);
    battle.spawn_unit(Faction::Player, &unit_data("guard"), hex(0, 1)).unwrap();
    // In range, moving, and stuck with no move range
    battle.spawn_unit(Faction::Enemy, &unit_data("near"), hex(2, 1)).unwrap();
    battle.spawn_unit(Faction::Enemy, &unit_with_move("far", 2), hex(7, 1)).unwrap();
    battle.spawn_unit(Faction::Enemy, &unit_with_move("anchored", 0), hex(7, 2)).unwrap();

    run_enemy_phase(&mut battle);
    let events = battle.drain_events();
    assert_eq!(turns_ended_before_player_phase(&events), Some(3));
    assert_eq!(battle.turns().enqueued(), 3);
    assert!(battle.can_interact());
}
