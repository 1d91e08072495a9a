#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `DuckDB` storage for lots, lot groups, and the civic records linked to
//! them.
//!
//! Everything lives in one `DuckDB` file (see [`paths::lot_db_path`]).
//! Polygons are stored as GeoJSON text with the centroid split into
//! `centroid_lon`/`centroid_lat` columns. [`lot_db::DuckDbLotStore`]
//! implements [`living_lots_lot::LotRepository`] so the lot services run
//! directly against the database.

pub mod geometry;
pub mod lot_db;
pub mod paths;
pub mod records;

use living_lots_lot::LotError;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` query error.
    #[error("Database error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Filesystem error while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// GeoJSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

impl From<DbError> for LotError {
    fn from(e: DbError) -> Self {
        Self::Storage {
            message: e.to_string(),
        }
    }
}

/// Parses a timestamp read back from `DuckDB` as text.
///
/// Accepts offset forms (`+00`, `+00:00`) as well as naive timestamps,
/// which are taken to be UTC.
pub(crate) fn parse_timestamp(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    use chrono::{DateTime, NaiveDateTime, Utc};

    for format in ["%Y-%m-%d %H:%M:%S%#z", "%Y-%m-%d %H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    log::warn!("Failed to parse timestamp: {s}");
    None
}

/// Formats a timestamp for binding into a `TIMESTAMP` column (UTC).
pub(crate) fn format_timestamp(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone as _, Utc};

    #[test]
    fn parses_duckdb_timestamp_text() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-15 10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15 10:30:00.000000"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15 10:30:00+00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15 05:30:00-05:00"), Some(expected));
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn formatted_timestamps_parse_back() {
        let dt = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(&dt)), Some(dt));
    }

    #[test]
    fn db_errors_become_storage_errors() {
        let err: LotError = DbError::Conversion {
            message: "bad row".to_string(),
        }
        .into();
        assert!(matches!(err, LotError::Storage { message } if message.contains("bad row")));
    }
}
