#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the `DuckDB` data directory.
//!
//! All paths are relative to the project root's `data/` directory unless
//! overridden with the `LIVING_LOTS_DB` environment variable.

use std::path::{Path, PathBuf};

/// Environment variable that overrides the lot database path.
pub const DB_PATH_ENV: &str = "LIVING_LOTS_DB";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
///
/// # Panics
///
/// Panics if the project root cannot be resolved.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("Failed to find project root from CARGO_MANIFEST_DIR")
        .to_path_buf()
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the default path for the lot `DuckDB` file.
#[must_use]
pub fn default_lot_db_path() -> PathBuf {
    data_dir().join("living_lots.duckdb")
}

/// Resolves the lot database path from an optional override.
///
/// Blank overrides are ignored.
#[must_use]
pub fn resolve_lot_db_path(override_path: Option<&str>) -> PathBuf {
    override_path
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map_or_else(default_lot_db_path, PathBuf::from)
}

/// Returns the path for the lot `DuckDB` file, honoring `LIVING_LOTS_DB`.
#[must_use]
pub fn lot_db_path() -> PathBuf {
    resolve_lot_db_path(std::env::var(DB_PATH_ENV).ok().as_deref())
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_override_falls_back_to_data_dir() {
        assert_eq!(resolve_lot_db_path(None), default_lot_db_path());
        assert_eq!(resolve_lot_db_path(Some("  ")), default_lot_db_path());
        assert!(default_lot_db_path().starts_with(data_dir()));
    }

    #[test]
    fn override_is_used_verbatim() {
        assert_eq!(
            resolve_lot_db_path(Some("/tmp/lots.duckdb")),
            PathBuf::from("/tmp/lots.duckdb")
        );
    }
}
