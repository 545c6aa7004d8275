//! Scenario file validation.

use std::fs;
use std::path::{Path, PathBuf};

use tactics_core::data::Scenario;
use tactics_core::error::GameError;

use crate::{Result, ToolError};

/// Problems found in one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// File checked.
    pub path: PathBuf,
    /// Parse or validation messages; empty when the file is fine.
    pub errors: Vec<String>,
}

/// Outcome of validating a file or directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// One entry per scenario file, in path order.
    pub files: Vec<FileReport>,
}

impl ValidationReport {
    /// Returns true if every file parsed and validated.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.files.iter().all(|f| f.errors.is_empty())
    }

    /// Total number of problems.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.files.iter().map(|f| f.errors.len()).sum()
    }
}

/// Read and parse one scenario file.
///
/// # Errors
///
/// Returns `ToolError::Io` if the file cannot be read and
/// `GameError::DataParseError` if it is not a valid scenario.
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Scenario::from_ron_str(&path.display().to_string(), &text)?)
}

/// Parse and validate a scenario without failing on bad content.
#[must_use]
pub fn check_scenario(path: &Path) -> FileReport {
    let errors = match load_scenario(path) {
        Ok(scenario) => scenario.validate(),
        Err(ToolError::Game(GameError::DataParseError { message, .. })) => vec![message],
        Err(other) => vec![other.to_string()],
    };
    FileReport {
        path: path.to_path_buf(),
        errors,
    }
}

/// Validate a scenario file, or every `.ron` file in a directory.
///
/// # Errors
///
/// Returns `ToolError::Io` if the path or directory cannot be read.
/// Problems inside files are reported, not returned as errors.
pub fn validate_path(path: &Path) -> Result<ValidationReport> {
    let io_error = |source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(path).map_err(io_error)?;
    if !metadata.is_dir() {
        return Ok(ValidationReport {
            files: vec![check_scenario(path)],
        });
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(io_error)? {
        let entry_path = entry.map_err(io_error)?.path();
        if entry_path.extension().is_some_and(|ext| ext == "ron") {
            files.push(entry_path);
        }
    }
    files.sort();

    let files = files
        .iter()
        .map(|file| {
            let report = check_scenario(file);
            tracing::debug!(path = %file.display(), errors = report.errors.len(), "Checked scenario");
            report
        })
        .collect();
    Ok(ValidationReport { files })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tactics-tools-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    const GOOD: &str = r#"
        Scenario(
            name: "Duel",
            layout: GridLayout(width: 4, height: 4),
            unit_types: [UnitData(id: "grunt", name: "Grunt", max_health: 4, starting_health: 4)],
            units: [
                UnitPlacement(unit: "grunt", faction: Player, coord: (q: 0, r: 0)),
                UnitPlacement(unit: "grunt", faction: Enemy, coord: (q: 3, r: 3)),
            ],
        )
    "#;

    #[test]
    fn test_directory_report_lists_each_file() {
        let dir = scratch_dir("dir");
        fs::write(dir.join("a_good.ron"), GOOD).unwrap();
        fs::write(dir.join("b_broken.ron"), "Scenario(").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let report = validate_path(&dir).unwrap();
        assert_eq!(report.files.len(), 2);
        assert!(report.files[0].errors.is_empty());
        assert_eq!(report.files[1].errors.len(), 1);
        assert!(!report.is_ok());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_invalid_placement_is_reported() {
        let dir = scratch_dir("placement");
        let file = dir.join("stacked.ron");
        fs::write(&file, GOOD.replace("(q: 3, r: 3)", "(q: 0, r: 0)")).unwrap();

        let report = validate_path(&file).unwrap();
        assert_eq!(report.error_count(), 1);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let missing = std::env::temp_dir().join("tactics-tools-does-not-exist.ron");
        assert!(matches!(validate_path(&missing), Err(ToolError::Io { .. })));
    }
}
