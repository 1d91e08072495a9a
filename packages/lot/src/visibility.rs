//! Public map visibility rules.
//!
//! Two related but distinct checks exist. [`is_visible`] answers whether a
//! single lot may be shown on its own page. [`is_publicly_listed`] is the
//! stricter filter for the public map listing: lots with a known use also
//! need the steward's opt-in, and group members are hidden behind their
//! group.

use living_lots_lot_models::{Lot, Use};

/// Lots at or below this certainty are hidden from the public.
pub const MIN_VISIBLE_CERTAINTY: u8 = 3;

/// Whether a lot should be publicly viewable.
///
/// True when there is no known use or its use is visible, no steward
/// projects exist or the steward opted in, and the certainty is above
/// [`MIN_VISIBLE_CERTAINTY`].
#[must_use]
pub fn is_visible(lot: &Lot, known_use: Option<&Use>) -> bool {
    known_use.is_none_or(|u| u.visible)
        && (lot.steward_project_count == 0 || lot.steward_inclusion_opt_in)
        && lot.known_use_certainty > MIN_VISIBLE_CERTAINTY
}

/// Whether a lot belongs in the public map listing.
///
/// `known_use` must be the use named by `lot.known_use_id`; a lot whose
/// use id points at a missing use is treated as having a hidden use.
#[must_use]
pub fn is_publicly_listed(lot: &Lot, known_use: Option<&Use>) -> bool {
    let use_ok = match (lot.known_use_id, known_use) {
        (None, _) => true,
        (Some(_), Some(u)) => u.visible && lot.steward_inclusion_opt_in,
        (Some(_), None) => false,
    };

    use_ok && lot.known_use_certainty > MIN_VISIBLE_CERTAINTY && lot.group_id.is_none()
}
