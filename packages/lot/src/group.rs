//! Lot group geometry maintenance.
//!
//! A lot group's polygon is the union of its members' polygons and its
//! centroid is the centroid of that union. Both are rebuilt whenever
//! membership changes: [`add`] and [`remove`] recompute from an explicitly
//! built member set (the membership change may not be stored yet), while
//! [`recompute`] with no member list rereads membership from the store.

use geo::{BooleanOps, Centroid, MultiPolygon};
use living_lots_lot_models::{Lot, LotGroup};

use crate::{LotError, LotRepository, measure};

/// Unions every member polygon, skipping members without a polygon or with
/// geometry that cannot be unioned.
///
/// Returns `None` when no member contributed a polygon.
#[must_use]
pub fn union_polygons<'a>(
    polygons: impl IntoIterator<Item = &'a MultiPolygon<f64>>,
) -> Option<MultiPolygon<f64>> {
    polygons
        .into_iter()
        .filter(|polygon| {
            let usable = measure::is_measurable(polygon);
            if !usable {
                log::warn!("Skipping unusable member polygon in group union");
            }
            usable
        })
        .fold(None, |acc: Option<MultiPolygon<f64>>, polygon| {
            Some(acc.map_or_else(|| polygon.clone(), |unioned| unioned.union(polygon)))
        })
}

/// Rebuilds the group's polygon and centroid from `members` without
/// touching the store.
pub fn apply_members(group: &mut LotGroup, members: &[Lot]) {
    let polygon = union_polygons(members.iter().filter_map(|m| m.polygon.as_ref()));

    group.lot.centroid = polygon.as_ref().and_then(|p| p.centroid());
    group.lot.polygon = polygon;
    group.lot.polygon_area = group.lot.polygon.as_ref().and_then(measure::polygon_area);
    group.lot.polygon_width = None;
}

/// Recomputes and persists the group's geometry.
///
/// With `members = None` the current membership is read from the store.
///
/// # Errors
///
/// Returns [`LotError`] if membership cannot be read or the group cannot be
/// saved.
pub fn recompute<R: LotRepository + ?Sized>(
    repo: &mut R,
    group: &mut LotGroup,
    members: Option<&[Lot]>,
) -> Result<(), LotError> {
    let fetched;
    let members = if let Some(members) = members {
        members
    } else {
        fetched = repo.group_members(group.id())?;
        fetched.as_slice()
    };

    apply_members(group, members);

    log::debug!(
        "Recomputed group {} from {} member(s), polygon {}",
        group.id(),
        members.len(),
        if group.lot.polygon.is_some() {
            "present"
        } else {
            "empty"
        }
    );

    repo.save_group(group)
}

/// Adds `member` to the group's membership set, then recomputes and
/// persists the group's geometry.
///
/// `member` replaces any stored copy of the same lot, so pending polygon
/// edits are reflected.
///
/// # Errors
///
/// Returns [`LotError`] if membership cannot be read or the group cannot be
/// saved.
pub fn add<R: LotRepository + ?Sized>(
    repo: &mut R,
    group: &mut LotGroup,
    member: &Lot,
) -> Result<(), LotError> {
    let mut members = repo.group_members(group.id())?;
    members.retain(|m| m.id != member.id);
    members.push(member.clone());
    members.sort_by_key(|m| m.id);

    log::info!("Adding lot {} to group {}", member.id, group.id());
    recompute(repo, group, Some(&members))
}

/// Removes `member` from the group's membership set, then recomputes and
/// persists the group's geometry.
///
/// # Errors
///
/// Returns [`LotError`] if membership cannot be read or the group cannot be
/// saved.
pub fn remove<R: LotRepository + ?Sized>(
    repo: &mut R,
    group: &mut LotGroup,
    member: &Lot,
) -> Result<(), LotError> {
    let mut members = repo.group_members(group.id())?;
    members.retain(|m| m.id != member.id);

    log::info!("Removing lot {} from group {}", member.id, group.id());
    recompute(repo, group, Some(&members))
}

/// Moves `lot` between groups when its group link changed.
///
/// Both groups are looked up before either is changed. Removes it from
/// `previous` (if any and different from `next`), then adds it to `next`
/// (if any and different from `previous`).
///
/// # Errors
///
/// Returns [`LotError::GroupNotFound`] if either group id does not name a
/// stored group, [`LotError::NestedGroup`] if `lot` is itself a group, or
/// any storage error.
pub fn transfer<R: LotRepository + ?Sized>(
    repo: &mut R,
    previous: Option<i64>,
    next: Option<i64>,
    lot: &Lot,
) -> Result<(), LotError> {
    if previous == next {
        return Ok(());
    }

    if let Some(group_id) = next.filter(|_| lot.is_group) {
        return Err(LotError::NestedGroup {
            id: lot.id,
            group_id,
        });
    }

    let mut previous_group = previous
        .map(|id| repo.group(id)?.ok_or(LotError::GroupNotFound { id }))
        .transpose()?;
    let mut next_group = next
        .map(|id| repo.group(id)?.ok_or(LotError::GroupNotFound { id }))
        .transpose()?;

    if let Some(group) = previous_group.as_mut() {
        remove(repo, group, lot)?;
    }

    if let Some(group) = next_group.as_mut() {
        add(repo, group, lot)?;
    }

    Ok(())
}

/// Number of lots a lot stands for: its member count if it is a group,
/// otherwise 1.
///
/// # Errors
///
/// Returns [`LotError`] if group members cannot be read.
pub fn number_of_lots<R: LotRepository + ?Sized>(repo: &R, lot: &Lot) -> Result<usize, LotError> {
    if lot.is_group {
        Ok(repo.group_members(lot.id)?.len())
    } else {
        Ok(1)
    }
}
