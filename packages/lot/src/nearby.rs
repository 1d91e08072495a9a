//! Finding lots near a lot.

use living_lots_lot_models::Lot;
use serde::Deserialize;

use crate::{LotError, LotRepository, measure};

/// Options for [`find_nearby`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct NearbyOptions {
    /// Search radius in miles.
    pub miles: f64,
    /// Maximum number of lots to return.
    pub count: usize,
    /// Only consider lots that pass the public listing filter.
    pub visible_only: bool,
    /// Include the lot itself in the results.
    pub include_self: bool,
}

impl Default for NearbyOptions {
    fn default() -> Self {
        Self {
            miles: 0.5,
            count: 5,
            visible_only: true,
            include_self: false,
        }
    }
}

/// A lot and its centroid distance from the search origin.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyLot {
    pub lot: Lot,
    pub distance_miles: f64,
}

/// Finds lots whose centroid lies within `options.miles` of `lot`'s
/// centroid, closest first.
///
/// A lot without a centroid has no neighbors.
///
/// # Errors
///
/// Returns [`LotError`] if candidate lots cannot be read.
pub fn find_nearby<R: LotRepository + ?Sized>(
    repo: &R,
    lot: &Lot,
    options: &NearbyOptions,
) -> Result<Vec<NearbyLot>, LotError> {
    let Some(origin) = lot.centroid else {
        return Ok(Vec::new());
    };

    let candidates = if options.visible_only {
        repo.visible_lots()?
    } else {
        repo.lots()?
    };

    let mut nearby: Vec<NearbyLot> = candidates
        .into_iter()
        .filter(|candidate| options.include_self || candidate.id != lot.id)
        .filter_map(|candidate| {
            let distance_miles = measure::distance_miles(origin, candidate.centroid?);
            (distance_miles <= options.miles).then_some(NearbyLot {
                lot: candidate,
                distance_miles,
            })
        })
        .collect();

    nearby.sort_by(|a, b| {
        a.distance_miles
            .total_cmp(&b.distance_miles)
            .then(a.lot.id.cmp(&b.lot.id))
    });
    nearby.truncate(options.count);

    Ok(nearby)
}
