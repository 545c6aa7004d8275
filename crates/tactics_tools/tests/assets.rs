//! The shipped scenario files must stay valid and playable.

use std::path::PathBuf;

use tactics_tools::simulate::{self, SimulationOptions};
use tactics_tools::validate;

fn scenarios_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/scenarios")
}

#[test]
fn test_shipped_scenarios_validate() {
    let report = validate::validate_path(&scenarios_dir()).unwrap();
    assert!(!report.files.is_empty());
    for file in &report.files {
        assert!(file.errors.is_empty(), "{}: {:?}", file.path.display(), file.errors);
    }
}

#[test]
fn test_shipped_scenarios_play_without_errors() {
    let report = validate::validate_path(&scenarios_dir()).unwrap();
    for file in &report.files {
        let scenario = validate::load_scenario(&file.path).unwrap();
        let summary = simulate::run(&scenario, SimulationOptions::default()).unwrap();
        assert!(summary.ticks > 0, "{} never ticked", file.path.display());
    }
}
