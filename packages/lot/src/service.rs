//! Lot maintenance operations.
//!
//! These wrap raw repository writes with the side effects a lot change
//! implies: moving the lot between groups, recomputing a group after a
//! member is deleted, following the parcel's polygon, and refreshing the
//! known use certainty.

use chrono::{DateTime, Utc};
use living_lots_lot_models::{Lot, LotGroup};

use crate::{LotError, LotRepository, certainty, group, measure};

/// Saves a lot, keeping group geometry in sync.
///
/// Before writing the lot row:
/// - a lot tied to its parcel takes the parcel's polygon (when the parcel
///   has one), and derived centroid/area/width are refreshed;
/// - if the lot's group changed since it was last stored, it is removed
///   from the old group and added to the new one;
/// - if the group did not change but the polygon did, the group is
///   recomputed with the new polygon.
///
/// `lot` is updated in place with the derived fields that were written.
///
/// # Errors
///
/// Returns [`LotError`] if a group named by the lot does not exist or any
/// read or write fails.
pub fn save_lot<R: LotRepository + ?Sized>(repo: &mut R, lot: &mut Lot) -> Result<(), LotError> {
    let stored = repo.lot(lot.id)?;
    let previous_group = stored.as_ref().and_then(|s| s.group_id);

    if !lot.is_group {
        let parcel_id = lot.parcel_id.filter(|_| lot.polygon_tied_to_parcel);
        if let Some(polygon) = parcel_id
            .map(|id| repo.parcel(id))
            .transpose()?
            .flatten()
            .and_then(|parcel| parcel.polygon)
        {
            lot.polygon = Some(polygon);
        }
        measure::refresh_derived_geometry(lot);
    }

    if previous_group == lot.group_id {
        let polygon_changed = stored.is_some_and(|s| s.polygon != lot.polygon);
        if let (Some(group_id), true) = (lot.group_id, polygon_changed) {
            let mut group = repo
                .group(group_id)?
                .ok_or(LotError::GroupNotFound { id: group_id })?;
            group::add(repo, &mut group, lot)?;
        }
    } else {
        group::transfer(repo, previous_group, lot.group_id, lot)?;
    }

    repo.save_lot(lot)
}

/// Deletes a lot and recomputes the group it belonged to from the
/// remaining members.
///
/// Returns the deleted lot.
///
/// # Errors
///
/// Returns [`LotError::LotNotFound`] if no such lot exists, or any storage
/// error.
pub fn delete_lot<R: LotRepository + ?Sized>(repo: &mut R, id: i64) -> Result<Lot, LotError> {
    let lot = repo.lot(id)?.ok_or(LotError::LotNotFound { id })?;

    repo.delete_lot(id)?;
    log::info!("Deleted lot {id}");

    if let Some(group_id) = lot.group_id {
        if let Some(mut group) = repo.group(group_id)? {
            group::recompute(repo, &mut group, None)?;
        } else {
            log::warn!("Lot {id} referenced missing group {group_id}");
        }
    }

    Ok(lot)
}

/// Creates and stores an empty lot group.
///
/// # Errors
///
/// Returns [`LotError`] if the store cannot allocate an id or write the
/// group.
pub fn create_group<R: LotRepository + ?Sized>(
    repo: &mut R,
    name: &str,
) -> Result<LotGroup, LotError> {
    let group = LotGroup::new(repo.next_lot_id()?, name);
    repo.save_group(&group)?;
    log::info!("Created lot group {} ({name})", group.id());
    Ok(group)
}

/// Outcome of refreshing one lot's certainty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertaintyRefresh {
    pub lot_id: i64,
    pub previous: u8,
    pub current: u8,
    pub locked: bool,
}

impl CertaintyRefresh {
    /// Whether the stored certainty changed.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Recomputes and stores a lot's known use certainty.
///
/// Locked lots are left untouched.
///
/// # Errors
///
/// Returns [`LotError::LotNotFound`] if no such lot exists, or any storage
/// error.
pub fn refresh_certainty<R: LotRepository + ?Sized>(
    repo: &mut R,
    id: i64,
    now: DateTime<Utc>,
) -> Result<CertaintyRefresh, LotError> {
    let details = repo.lot_details(id)?.ok_or(LotError::LotNotFound { id })?;
    let previous = details.lot.known_use_certainty;
    let locked = details.lot.known_use_locked;
    let current = certainty::estimate(&details, now);

    let refresh = CertaintyRefresh {
        lot_id: id,
        previous,
        current,
        locked,
    };

    if refresh.changed() {
        let mut lot = details.lot;
        lot.known_use_certainty = current;
        repo.save_lot(&lot)?;
        log::debug!("Lot {id} certainty {previous} -> {current}");
    }

    Ok(refresh)
}

/// Totals from [`refresh_all_certainties`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub examined: u64,
    pub updated: u64,
    pub locked: u64,
}

/// Refreshes the certainty of every stored lot.
///
/// # Errors
///
/// Returns [`LotError`] on the first storage failure.
pub fn refresh_all_certainties<R: LotRepository + ?Sized>(
    repo: &mut R,
    now: DateTime<Utc>,
) -> Result<RefreshSummary, LotError> {
    let mut summary = RefreshSummary::default();

    for lot in repo.lots()? {
        let refresh = refresh_certainty(repo, lot.id, now)?;
        summary.examined += 1;
        if refresh.locked {
            summary.locked += 1;
        }
        if refresh.changed() {
            summary.updated += 1;
        }
    }

    log::info!(
        "Refreshed certainty for {} lots ({} updated, {} locked)",
        summary.examined,
        summary.updated,
        summary.locked
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLotStore;
    use chrono::TimeZone as _;
    use geo::{LineString, MultiPolygon, Polygon};
    use living_lots_lot_models::{LandUseArea, Parcel};

    fn square(x: f64, y: f64) -> MultiPolygon<f64> {
        let size = 0.0001;
        MultiPolygon(vec![Polygon::new(
            LineString::from(vec![
                (x, y),
                (x + size, y),
                (x + size, y + size),
                (x, y + size),
                (x, y),
            ]),
            vec![],
        )])
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn free_lot(id: i64, polygon: MultiPolygon<f64>) -> Lot {
        let mut lot = Lot::new(id);
        lot.polygon = Some(polygon);
        lot.polygon_tied_to_parcel = false;
        lot
    }

    #[test]
    fn joining_a_group_updates_its_polygon() {
        let mut store = MemoryLotStore::default();
        let group = create_group(&mut store, "Block").unwrap();
        let mut a = free_lot(10, square(-75.15, 39.98));
        let mut b = free_lot(11, square(-75.14, 39.98));
        save_lot(&mut store, &mut a).unwrap();
        save_lot(&mut store, &mut b).unwrap();

        a.group_id = Some(group.id());
        save_lot(&mut store, &mut a).unwrap();
        b.group_id = Some(group.id());
        save_lot(&mut store, &mut b).unwrap();

        let stored = store.group(group.id()).unwrap().unwrap();
        assert_eq!(stored.lot.polygon.unwrap().0.len(), 2);
        assert!(stored.lot.centroid.is_some());
        assert_eq!(store.group_members(group.id()).unwrap().len(), 2);
    }

    #[test]
    fn leaving_a_group_updates_its_polygon() {
        let mut store = MemoryLotStore::default();
        let group = create_group(&mut store, "Block").unwrap();
        let mut a = free_lot(10, square(-75.15, 39.98));
        a.group_id = Some(group.id());
        save_lot(&mut store, &mut a).unwrap();

        a.group_id = None;
        save_lot(&mut store, &mut a).unwrap();

        let stored = store.group(group.id()).unwrap().unwrap();
        assert!(stored.lot.polygon.is_none());
        assert!(stored.lot.centroid.is_none());
    }

    #[test]
    fn moving_to_missing_group_leaves_old_group_intact() {
        let mut store = MemoryLotStore::default();
        let group = create_group(&mut store, "Block").unwrap();
        let mut a = free_lot(10, square(-75.15, 39.98));
        a.group_id = Some(group.id());
        save_lot(&mut store, &mut a).unwrap();
        let before = store.group(group.id()).unwrap().unwrap();

        a.group_id = Some(999);
        let err = save_lot(&mut store, &mut a).unwrap_err();
        assert!(matches!(err, LotError::GroupNotFound { id: 999 }));

        assert_eq!(store.lot(10).unwrap().unwrap().group_id, Some(group.id()));
        let after = store.group(group.id()).unwrap().unwrap();
        assert_eq!(after.lot.polygon, before.lot.polygon);
        assert!(after.lot.polygon.is_some());
    }

    #[test]
    fn polygon_edit_within_group_recomputes_group() {
        let mut store = MemoryLotStore::default();
        let group = create_group(&mut store, "Block").unwrap();
        let mut a = free_lot(10, square(-75.15, 39.98));
        a.group_id = Some(group.id());
        save_lot(&mut store, &mut a).unwrap();

        let moved = square(-75.10, 39.90);
        a.polygon = Some(moved.clone());
        save_lot(&mut store, &mut a).unwrap();

        assert_eq!(
            store.group(group.id()).unwrap().unwrap().lot.polygon,
            Some(moved)
        );
    }

    #[test]
    fn deleting_member_recomputes_group_from_remaining_members() {
        let mut store = MemoryLotStore::default();
        let group = create_group(&mut store, "Block").unwrap();
        let mut a = free_lot(10, square(-75.15, 39.98));
        let mut b = free_lot(11, square(-75.14, 39.98));
        a.group_id = Some(group.id());
        b.group_id = Some(group.id());
        save_lot(&mut store, &mut a).unwrap();
        save_lot(&mut store, &mut b).unwrap();

        delete_lot(&mut store, 10).unwrap();

        let stored = store.group(group.id()).unwrap().unwrap();
        assert_eq!(stored.lot.polygon, b.polygon);
    }

    #[test]
    fn deleting_missing_lot_fails() {
        let mut store = MemoryLotStore::default();
        assert!(matches!(
            delete_lot(&mut store, 3),
            Err(LotError::LotNotFound { id: 3 })
        ));
    }

    #[test]
    fn tied_lot_follows_parcel_polygon() {
        let mut store = MemoryLotStore::default();
        let parcel_polygon = square(-75.2, 39.95);
        store.insert_parcel(Parcel {
            id: 4,
            polygon: Some(parcel_polygon.clone()),
        });
        let mut lot = Lot::new(1);
        lot.parcel_id = Some(4);

        save_lot(&mut store, &mut lot).unwrap();

        let stored = store.lot(1).unwrap().unwrap();
        assert_eq!(stored.polygon, Some(parcel_polygon));
        assert!(stored.polygon_area.is_some_and(|a| a > 0.0));
        assert!(stored.centroid.is_some());
    }

    #[test]
    fn refresh_updates_unlocked_and_skips_locked() {
        let mut store = MemoryLotStore::default();
        store.insert_land_use_area(LandUseArea {
            id: 1,
            subcategory: Some("Vacant".to_string()),
        });

        let mut open = Lot::new(1);
        open.land_use_area_id = Some(1);
        let mut locked = Lot::new(2);
        locked.land_use_area_id = Some(1);
        locked.known_use_locked = true;
        locked.known_use_certainty = 7;
        store.save_lot(&open).unwrap();
        store.save_lot(&locked).unwrap();

        let summary = refresh_all_certainties(&mut store, now()).unwrap();

        assert_eq!(
            summary,
            RefreshSummary {
                examined: 2,
                updated: 1,
                locked: 1,
            }
        );
        assert_eq!(store.lot(1).unwrap().unwrap().known_use_certainty, 4);
        assert_eq!(store.lot(2).unwrap().unwrap().known_use_certainty, 7);

        let again = refresh_certainty(&mut store, 1, now()).unwrap();
        assert!(!again.changed());
    }
}
