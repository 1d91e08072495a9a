//! Compile-time registry of default known use classifications.
//!
//! The uses are defined in `uses/uses.toml`, embedded via `include_str!`,
//! and seeded into fresh databases.

use living_lots_lot_models::Use;
use serde::Deserialize;

/// Number of default uses. Enforced by a test.
#[cfg(test)]
const EXPECTED_USE_COUNT: usize = 8;

const USES_TOML: &str = include_str!("../uses/uses.toml");

#[derive(Deserialize)]
struct UseFile {
    uses: Vec<Use>,
}

/// Returns the default uses, with ids assigned from 1 in file order.
///
/// # Panics
///
/// Panics if the embedded TOML fails to parse. Since it is a compile-time
/// constant, a parse failure is a development error caught by tests.
#[must_use]
pub fn default_uses() -> Vec<Use> {
    let file: UseFile = toml::de::from_str(USES_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse embedded uses.toml: {e}"));

    file.uses
        .into_iter()
        .zip(1..)
        .map(|(known_use, id)| Use { id, ..known_use })
        .collect()
}
