//! Operations behind each CLI subcommand.
//!
//! Each function works on an open store and returns what happened, so
//! `main` and the interactive menu only format output.

use chrono::{DateTime, Utc};
use living_lots_database::{DbError, lot_db::DuckDbLotStore};
use living_lots_lot::{
    LotError, LotRepository as _,
    certainty::{self, CertaintyExplanation},
    group, registry,
    service::{self, RefreshSummary},
};
use living_lots_lot_models::{Lot, LotGroup};

/// Creates the schema (already done on open) and seeds the default uses.
///
/// Returns the number of uses inserted.
///
/// # Errors
///
/// Returns [`DbError`] if seeding fails.
pub fn init(store: &DuckDbLotStore) -> Result<usize, DbError> {
    store.seed_uses(&registry::default_uses())
}

/// Refreshes certainty for one lot, or every lot when `lot` is `None`.
///
/// # Errors
///
/// Returns [`LotError::LotNotFound`] for an unknown lot id, or any storage
/// error.
pub fn refresh_certainty(
    store: &mut DuckDbLotStore,
    lot: Option<i64>,
    now: DateTime<Utc>,
) -> Result<RefreshSummary, LotError> {
    let Some(id) = lot else {
        return service::refresh_all_certainties(store, now);
    };

    let refresh = service::refresh_certainty(store, id, now)?;
    log::info!(
        "Lot {id} certainty {} -> {}",
        refresh.previous,
        refresh.current
    );

    Ok(RefreshSummary {
        examined: 1,
        updated: u64::from(refresh.changed()),
        locked: u64::from(refresh.locked),
    })
}

/// Explains how a lot's certainty would be computed now.
///
/// # Errors
///
/// Returns [`LotError::LotNotFound`] for an unknown lot id, or any storage
/// error.
pub fn explain_certainty(
    store: &DuckDbLotStore,
    id: i64,
    now: DateTime<Utc>,
) -> Result<CertaintyExplanation, LotError> {
    let details = store.lot_details(id)?.ok_or(LotError::LotNotFound { id })?;
    Ok(certainty::explain(&details, now))
}

/// Creates an empty group.
///
/// # Errors
///
/// Returns [`LotError`] if the group cannot be stored.
pub fn group_create(store: &mut DuckDbLotStore, name: &str) -> Result<LotGroup, LotError> {
    service::create_group(store, name)
}

fn stored_lot(store: &DuckDbLotStore, id: i64) -> Result<Lot, LotError> {
    store.lot(id)?.ok_or(LotError::LotNotFound { id })
}

/// Moves a lot into a group, updating both the old and new group.
///
/// Returns the group as stored afterwards.
///
/// # Errors
///
/// Returns [`LotError`] if either id is unknown, the lot is itself a
/// group, or any storage error.
pub fn group_add(
    store: &mut DuckDbLotStore,
    group_id: i64,
    lot_id: i64,
) -> Result<LotGroup, LotError> {
    let mut lot = stored_lot(store, lot_id)?;
    lot.group_id = Some(group_id);
    service::save_lot(store, &mut lot)?;

    store
        .group(group_id)?
        .ok_or(LotError::GroupNotFound { id: group_id })
}

/// Takes a lot out of its group.
///
/// Returns the group it left, if any.
///
/// # Errors
///
/// Returns [`LotError`] if the lot is unknown or any storage error.
pub fn group_remove(store: &mut DuckDbLotStore, lot_id: i64) -> Result<Option<LotGroup>, LotError> {
    let mut lot = stored_lot(store, lot_id)?;
    let Some(previous) = lot.group_id.take() else {
        return Ok(None);
    };

    service::save_lot(store, &mut lot)?;
    store.group(previous)
}

/// Recomputes a group's polygon and centroid from its stored members.
///
/// # Errors
///
/// Returns [`LotError::GroupNotFound`] for an unknown group, or any
/// storage error.
pub fn group_recompute(store: &mut DuckDbLotStore, group_id: i64) -> Result<LotGroup, LotError> {
    let mut lot_group = store
        .group(group_id)?
        .ok_or(LotError::GroupNotFound { id: group_id })?;
    group::recompute(store, &mut lot_group, None)?;
    Ok(lot_group)
}

/// Deletes a lot and keeps its group in sync.
///
/// # Errors
///
/// Returns [`LotError::LotNotFound`] for an unknown lot, or any storage
/// error.
pub fn delete_lot(store: &mut DuckDbLotStore, id: i64) -> Result<Lot, LotError> {
    service::delete_lot(store, id)
}

/// Prints a certainty explanation as a table.
pub fn print_explanation(id: i64, explanation: &CertaintyExplanation) {
    println!(
        "Lot {id}: certainty {} ({})",
        explanation.certainty, explanation.basis
    );

    if explanation.contributions.is_empty() {
        return;
    }

    println!();
    println!("{:<28} {:>6} {:>4}", "CONTRIBUTION", "POINTS", "CAP");
    println!("{}", "-".repeat(40));
    for c in &explanation.contributions {
        println!("{:<28} {:>6} {:>4}", c.kind.as_ref(), c.points, c.cap);
    }
}

/// Prints a refresh summary.
pub fn print_summary(summary: &RefreshSummary) {
    println!(
        "Examined {} lots: {} updated, {} locked",
        summary.examined, summary.updated, summary.locked
    );
}

/// Prints the stored uses.
///
/// # Errors
///
/// Returns [`DbError`] if the uses cannot be read.
pub fn print_uses(store: &DuckDbLotStore) -> Result<(), DbError> {
    println!("{:<4} {:<28} {:<28} VISIBLE", "ID", "NAME", "SLUG");
    println!("{}", "-".repeat(70));
    for u in store.uses()? {
        println!("{:<4} {:<28} {:<28} {}", u.id, u.name, u.slug, u.visible);
    }
    Ok(())
}
