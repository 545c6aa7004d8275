//! Player interaction as seen through the highlight and HUD sinks.

use tactics_core::prelude::*;
use tactics_test_utils::fixtures::{hex, open_battle, settle, unit_data, unit_with_move};
use tactics_test_utils::recording::{HudState, RecordingHighlighter, RecordingHud};

fn watched_battle() -> (Battle, RecordingHighlighter, RecordingHud) {
    let mut battle = open_battle(7, 7);
    let highlighter = RecordingHighlighter::new();
    let hud = RecordingHud::new();
    battle.set_highlighter(Box::new(highlighter.clone()));
    battle.set_hud(Box::new(hud.clone()));
    (battle, highlighter, hud)
}

#[test]
fn test_selection_shows_move_area_and_hud() {
    let (mut battle, highlighter, hud) = watched_battle();
    let scout = battle
        .spawn_unit(Faction::Player, &unit_with_move("scout", 2), hex(3, 3))
        .unwrap();

    assert!(battle.select_unit(hex(3, 3)).unwrap().is_accepted());
    assert_eq!(battle.selected(), Some(scout));
    assert_eq!(battle.unit(scout).unwrap().state(), UnitState::PlanningMovement);
    assert_eq!(highlighter.kind_at(hex(3, 3)), Some(HighlightKind::UnitSelection));
    // Two rings around the unit
    assert_eq!(highlighter.tiles_with(HighlightKind::MoveArea).len(), 18);
    assert_eq!(
        hud.state(),
        HudState {
            move_range: Some((2, 2)),
            attack_panel: true,
        }
    );

    battle.deselect_unit().unwrap();
    assert!(highlighter.is_empty());
    assert_eq!(hud.state(), HudState::default());
    assert_eq!(battle.unit(scout).unwrap().state(), UnitState::Idle);
}

#[test]
fn test_selecting_enemy_or_empty_tile_is_rejected() {
    let (mut battle, _, _) = watched_battle();
    battle
        .spawn_unit(Faction::Enemy, &unit_data("raider"), hex(1, 1))
        .unwrap();

    assert_eq!(
        battle.select_unit(hex(1, 1)).unwrap(),
        ActionOutcome::Rejected(RejectReason::NotAPlayerUnit)
    );
    assert_eq!(
        battle.select_unit(hex(4, 4)).unwrap(),
        ActionOutcome::Rejected(RejectReason::NoUnitThere)
    );
    assert!(battle.select_unit(hex(40, 40)).is_err());
}

#[test]
fn test_path_preview_marks_validity() {
    let (mut battle, highlighter, _) = watched_battle();
    battle
        .spawn_unit(Faction::Player, &unit_with_move("scout", 2), hex(0, 0))
        .unwrap();
    battle.select_unit(hex(0, 0)).unwrap();

    battle.preview_path(hex(2, 0)).unwrap();
    assert_eq!(highlighter.kind_at(hex(2, 0)), Some(HighlightKind::ValidPath));

    battle.preview_path(hex(0, 4)).unwrap();
    assert_eq!(highlighter.kind_at(hex(0, 4)), Some(HighlightKind::InvalidPath));
    assert_eq!(highlighter.kind_at(hex(0, 0)), Some(HighlightKind::UnitSelection));
}

#[test]
fn test_move_updates_hud_range() {
    let (mut battle, _, hud) = watched_battle();
    battle
        .spawn_unit(Faction::Player, &unit_with_move("scout", 3), hex(0, 0))
        .unwrap();
    battle.select_unit(hex(0, 0)).unwrap();

    assert!(battle.request_move(hex(0, 2)).unwrap().is_accepted());
    assert_eq!(hud.state().move_range, Some((1, 3)));
    settle(&mut battle, 100);
    assert_eq!(hud.state().move_range, Some((1, 3)));
}

#[test]
fn test_attack_flow_through_requests() {
    let (mut battle, highlighter, hud) = watched_battle();
    let hero = battle
        .spawn_unit(Faction::Player, &unit_data("hero"), hex(0, 0))
        .unwrap();
    let foe = battle
        .spawn_unit(Faction::Enemy, &unit_data("foe"), hex(0, 2))
        .unwrap();
    battle.select_unit(hex(0, 0)).unwrap();

    assert_eq!(
        battle.request_attack(hex(0, 2)).unwrap(),
        ActionOutcome::Rejected(RejectReason::NotPlanning)
    );
    assert!(battle.request_plan_attack().unwrap().is_accepted());
    assert!(!hud.state().attack_panel);
    assert!(highlighter.tiles_with(HighlightKind::AttackArea).contains(&hex(0, 2)));
    assert!(highlighter.tiles_with(HighlightKind::MoveArea).is_empty());

    assert!(battle.request_attack(hex(0, 2)).unwrap().is_accepted());
    assert_eq!(highlighter.kind_at(hex(0, 2)), Some(HighlightKind::AttackTarget));
    settle(&mut battle, 100);

    assert_eq!(battle.unit(foe).unwrap().health(), 4);
    assert_eq!(battle.unit(hero).unwrap().state(), UnitState::PlanningMovement);
    assert!(highlighter.tiles_with(HighlightKind::AttackArea).is_empty());
}

#[test]
fn test_requests_refused_while_enemies_act() {
    let (mut battle, _, _) = watched_battle();
    battle
        .spawn_unit(Faction::Player, &unit_data("hero"), hex(0, 0))
        .unwrap();
    battle
        .spawn_unit(Faction::Enemy, &unit_with_move("raider", 2), hex(6, 6))
        .unwrap();

    assert!(battle.request_end_turn().unwrap().is_accepted());
    assert!(battle.is_busy());
    assert_eq!(
        battle.request_end_turn().unwrap(),
        ActionOutcome::Rejected(RejectReason::InteractionDisabled)
    );
    assert_eq!(
        battle.request_plan_attack().unwrap(),
        ActionOutcome::Rejected(RejectReason::InteractionDisabled)
    );
    settle(&mut battle, 1_000);
    assert!(battle.can_interact());
}
