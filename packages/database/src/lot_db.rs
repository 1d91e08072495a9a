//! The lot `DuckDB` database.
//!
//! Lots and lot groups share the `lots` table; a group row has
//! `is_group = TRUE` and its members point at it through `group_id`.
//! The reference tables (owners, uses, parcels, licenses, ...) are written
//! by importers through [`crate::records`].

use std::path::Path;

use duckdb::Connection;
use geo::Point;
use living_lots_lot::{LotError, LotRepository};
use living_lots_lot_models::{Lot, LotDetails, LotGroup, Parcel, Use};

use crate::{DbError, geometry};

/// Columns selected for every lot read, in [`lot_from_row`] order.
const LOT_COLUMNS: &str = "id, name, address_line1, polygon, centroid_lon, centroid_lat,
    owner_id, billing_account_id, tax_account_id, parcel_id, land_use_area_id,
    available_property_id, water_parcel_id, known_use_id, known_use_certainty,
    known_use_locked, steward_inclusion_opt_in, steward_project_count, group_id,
    is_group, polygon_area, polygon_width, polygon_tied_to_parcel, added::TEXT";

/// Filter shared by every public listing query.
const PUBLIC_LISTING_IDS: &str = "SELECT l.id FROM lots l
    LEFT JOIN uses u ON u.id = l.known_use_id
    WHERE (l.known_use_id IS NULL
           OR (COALESCE(u.visible, FALSE) AND l.steward_inclusion_opt_in))
      AND l.known_use_certainty > ?
      AND l.group_id IS NULL";

/// A lot with the linked fields the map listing shows.
#[derive(Debug, Clone, PartialEq)]
pub struct LotListing {
    pub lot: Lot,
    /// Owner name when the owner record exists.
    pub owner_name: Option<String>,
    /// Whether an available property record is linked.
    pub is_available: bool,
}

/// A [`LotRepository`] backed by a `DuckDB` connection.
pub struct DuckDbLotStore {
    conn: Connection,
}

impl std::fmt::Debug for DuckDbLotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbLotStore").finish_non_exhaustive()
    }
}

/// Opens (or creates) the lot database at `path` and ensures the schema
/// exists.
///
/// # Errors
///
/// Returns [`DbError`] if the directory, connection, or schema creation
/// fails.
pub fn open(path: &Path) -> Result<DuckDbLotStore, DbError> {
    if let Some(parent) = path.parent() {
        crate::paths::ensure_dir(parent)?;
    }

    let conn = Connection::open(path)?;
    conn.execute_batch("SET threads = 4;")?;
    log::debug!("Opened lot database at {}", path.display());

    DuckDbLotStore::from_connection(conn)
}

/// Opens the lot database at the default path.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_default() -> Result<DuckDbLotStore, DbError> {
    open(&crate::paths::lot_db_path())
}

/// Opens a throwaway in-memory lot database.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<DuckDbLotStore, DbError> {
    DuckDbLotStore::from_connection(Connection::open_in_memory()?)
}

/// Creates every table used by the lot database.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails.
pub fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS owners (
            id BIGINT PRIMARY KEY,
            name TEXT NOT NULL,
            owner_type TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS uses (
            id BIGINT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL,
            visible BOOLEAN NOT NULL DEFAULT TRUE
        );

        CREATE TABLE IF NOT EXISTS available_properties (
            id BIGINT PRIMARY KEY,
            status TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS land_use_areas (
            id BIGINT PRIMARY KEY,
            subcategory TEXT
        );

        CREATE TABLE IF NOT EXISTS water_parcels (
            id BIGINT PRIMARY KEY,
            percent_permeable DOUBLE,
            building_description TEXT,
            gross_area DOUBLE
        );

        CREATE TABLE IF NOT EXISTS billing_accounts (
            id BIGINT PRIMARY KEY,
            land_area DOUBLE
        );

        CREATE TABLE IF NOT EXISTS parcels (
            id BIGINT PRIMARY KEY,
            polygon TEXT
        );

        CREATE TABLE IF NOT EXISTS licenses (
            id BIGINT PRIMARY KEY,
            status TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS violations (
            id BIGINT PRIMARY KEY,
            violation_datetime TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS lot_licenses (
            lot_id BIGINT NOT NULL,
            license_id BIGINT NOT NULL,
            PRIMARY KEY (lot_id, license_id)
        );

        CREATE TABLE IF NOT EXISTS lot_violations (
            lot_id BIGINT NOT NULL,
            violation_id BIGINT NOT NULL,
            PRIMARY KEY (lot_id, violation_id)
        );

        CREATE TABLE IF NOT EXISTS lots (
            id BIGINT PRIMARY KEY,
            name TEXT,
            address_line1 TEXT,
            polygon TEXT,
            centroid_lon DOUBLE,
            centroid_lat DOUBLE,
            owner_id BIGINT,
            billing_account_id BIGINT,
            tax_account_id BIGINT,
            parcel_id BIGINT,
            land_use_area_id BIGINT,
            available_property_id BIGINT,
            water_parcel_id BIGINT,
            known_use_id BIGINT,
            known_use_certainty BIGINT NOT NULL DEFAULT 0,
            known_use_locked BOOLEAN NOT NULL DEFAULT FALSE,
            steward_inclusion_opt_in BOOLEAN NOT NULL DEFAULT FALSE,
            steward_project_count BIGINT NOT NULL DEFAULT 0,
            group_id BIGINT,
            is_group BOOLEAN NOT NULL DEFAULT FALSE,
            polygon_area DOUBLE,
            polygon_width DOUBLE,
            polygon_tied_to_parcel BOOLEAN NOT NULL DEFAULT TRUE,
            added TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )?;

    Ok(())
}

/// Maps a single-row query result, treating "no rows" as `None`.
pub(crate) fn optional<T>(result: duckdb::Result<T>) -> Result<Option<T>, DbError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DbError::DuckDb(e)),
    }
}

fn min_listed_certainty() -> i64 {
    i64::from(living_lots_lot::visibility::MIN_VISIBLE_CERTAINTY)
}

fn lot_from_row(row: &duckdb::Row<'_>) -> Result<Lot, DbError> {
    let id: i64 = row.get(0)?;
    let centroid_lon: Option<f64> = row.get(4)?;
    let centroid_lat: Option<f64> = row.get(5)?;
    let certainty: i64 = row.get(14)?;
    let project_count: i64 = row.get(17)?;
    let added: String = row.get(23)?;

    Ok(Lot {
        id,
        name: row.get(1)?,
        address_line1: row.get(2)?,
        polygon: geometry::decode_column(id, row.get(3)?),
        centroid: centroid_lon
            .zip(centroid_lat)
            .map(|(lon, lat)| Point::new(lon, lat)),
        owner_id: row.get(6)?,
        billing_account_id: row.get(7)?,
        tax_account_id: row.get(8)?,
        parcel_id: row.get(9)?,
        land_use_area_id: row.get(10)?,
        available_property_id: row.get(11)?,
        water_parcel_id: row.get(12)?,
        known_use_id: row.get(13)?,
        known_use_certainty: u8::try_from(certainty).map_err(|_| DbError::Conversion {
            message: format!("Lot {id} has out of range certainty {certainty}"),
        })?,
        known_use_locked: row.get(15)?,
        steward_inclusion_opt_in: row.get(16)?,
        steward_project_count: u32::try_from(project_count).map_err(|_| DbError::Conversion {
            message: format!("Lot {id} has out of range steward project count {project_count}"),
        })?,
        group_id: row.get(18)?,
        is_group: row.get(19)?,
        polygon_area: row.get(20)?,
        polygon_width: row.get(21)?,
        polygon_tied_to_parcel: row.get(22)?,
        added: crate::parse_timestamp(&added).ok_or_else(|| DbError::Conversion {
            message: format!("Lot {id} has unparseable added timestamp {added}"),
        })?,
    })
}

impl DuckDbLotStore {
    /// Wraps an existing connection, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if schema creation fails.
    pub fn from_connection(conn: Connection) -> Result<Self, DbError> {
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    fn query_lots(&self, sql: &str, params: &[&dyn duckdb::ToSql]) -> Result<Vec<Lot>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;

        let mut lots = Vec::new();
        while let Some(row) = rows.next()? {
            lots.push(lot_from_row(row)?);
        }

        Ok(lots)
    }

    /// Fetches a single lot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn get_lot(&self, id: i64) -> Result<Option<Lot>, DbError> {
        let sql = format!("SELECT {LOT_COLUMNS} FROM lots WHERE id = ?");
        Ok(self.query_lots(&sql, duckdb::params![id])?.into_iter().next())
    }

    /// Fetches every lot ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn all_lots(&self) -> Result<Vec<Lot>, DbError> {
        self.query_lots(&format!("SELECT {LOT_COLUMNS} FROM lots ORDER BY id"), &[])
    }

    /// Fetches lots that pass the public listing filter, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn publicly_listed_lots(&self) -> Result<Vec<Lot>, DbError> {
        let sql = format!(
            "SELECT {LOT_COLUMNS} FROM lots WHERE id IN ({PUBLIC_LISTING_IDS}) ORDER BY id"
        );
        self.query_lots(&sql, duckdb::params![min_listed_certainty()])
    }

    /// Fetches lots with an owner name and availability flag for the map,
    /// ordered by id. With `public_only`, only lots passing the public
    /// listing filter are returned.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn lot_listings(&self, public_only: bool) -> Result<Vec<LotListing>, DbError> {
        let filter = if public_only {
            format!("WHERE id IN ({PUBLIC_LISTING_IDS})")
        } else {
            String::new()
        };
        let sql = format!(
            "SELECT {LOT_COLUMNS}, owner_name, is_available FROM (
                 SELECT l.*, o.name AS owner_name, ap.id IS NOT NULL AS is_available
                 FROM lots l
                 LEFT JOIN owners o ON o.id = l.owner_id
                 LEFT JOIN available_properties ap ON ap.id = l.available_property_id
             ) {filter}
             ORDER BY id"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = if public_only {
            stmt.query(duckdb::params![min_listed_certainty()])?
        } else {
            stmt.query([])?
        };

        let mut listings = Vec::new();
        while let Some(row) = rows.next()? {
            listings.push(LotListing {
                lot: lot_from_row(row)?,
                owner_name: row.get(24)?,
                is_available: row.get(25)?,
            });
        }

        Ok(listings)
    }

    /// Fetches the members of a group ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn members_of(&self, group_id: i64) -> Result<Vec<Lot>, DbError> {
        let sql = format!("SELECT {LOT_COLUMNS} FROM lots WHERE group_id = ? ORDER BY id");
        self.query_lots(&sql, duckdb::params![group_id])
    }

    /// Returns one more than the highest stored lot id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn max_lot_id_plus_one(&self) -> Result<i64, DbError> {
        Ok(self
            .conn
            .query_row("SELECT COALESCE(MAX(id), 0) + 1 FROM lots", [], |row| {
                row.get(0)
            })?)
    }

    /// Inserts or replaces a lot row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write fails.
    pub fn upsert_lot(&self, lot: &Lot) -> Result<(), DbError> {
        let polygon = geometry::encode_column(lot.polygon.as_ref())?;
        let added = crate::format_timestamp(&lot.added);

        self.conn.execute(
            "INSERT OR REPLACE INTO lots (
                id, name, address_line1, polygon, centroid_lon, centroid_lat,
                owner_id, billing_account_id, tax_account_id, parcel_id,
                land_use_area_id, available_property_id, water_parcel_id,
                known_use_id, known_use_certainty, known_use_locked,
                steward_inclusion_opt_in, steward_project_count, group_id,
                is_group, polygon_area, polygon_width, polygon_tied_to_parcel,
                added
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                      CAST(? AS TIMESTAMP))",
            duckdb::params![
                lot.id,
                lot.name,
                lot.address_line1,
                polygon,
                lot.longitude(),
                lot.latitude(),
                lot.owner_id,
                lot.billing_account_id,
                lot.tax_account_id,
                lot.parcel_id,
                lot.land_use_area_id,
                lot.available_property_id,
                lot.water_parcel_id,
                lot.known_use_id,
                i64::from(lot.known_use_certainty),
                lot.known_use_locked,
                lot.steward_inclusion_opt_in,
                i64::from(lot.steward_project_count),
                lot.group_id,
                lot.is_group,
                lot.polygon_area,
                lot.polygon_width,
                lot.polygon_tied_to_parcel,
                added,
            ],
        )?;

        Ok(())
    }

    /// Deletes a lot row, its license/violation links, and detaches any
    /// lots that named it as their group.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any write fails. Nothing is changed on
    /// failure.
    pub fn remove_lot(&mut self, id: i64) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM lots WHERE id = ?", duckdb::params![id])?;
        let detached = tx.execute(
            "UPDATE lots SET group_id = NULL WHERE group_id = ?",
            duckdb::params![id],
        )?;
        tx.execute("DELETE FROM lot_licenses WHERE lot_id = ?", duckdb::params![id])?;
        tx.execute("DELETE FROM lot_violations WHERE lot_id = ?", duckdb::params![id])?;
        tx.commit()?;

        if detached > 0 {
            log::info!("Detached {detached} lots from deleted group {id}");
        }

        Ok(())
    }

    /// Fetches a lot joined with every linked record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any query fails.
    pub fn get_lot_details(&self, id: i64) -> Result<Option<LotDetails>, DbError> {
        let Some(lot) = self.get_lot(id)? else {
            return Ok(None);
        };

        Ok(Some(LotDetails {
            owner: lot.owner_id.map(|i| self.owner(i)).transpose()?.flatten(),
            known_use: lot.known_use_id.map(|i| self.get_use(i)).transpose()?.flatten(),
            available_property: lot
                .available_property_id
                .map(|i| self.available_property(i))
                .transpose()?
                .flatten(),
            land_use_area: lot
                .land_use_area_id
                .map(|i| self.land_use_area(i))
                .transpose()?
                .flatten(),
            water_parcel: lot
                .water_parcel_id
                .map(|i| self.water_parcel(i))
                .transpose()?
                .flatten(),
            billing_account: lot
                .billing_account_id
                .map(|i| self.billing_account(i))
                .transpose()?
                .flatten(),
            licenses: self.licenses_for_lot(id)?,
            violations: self.violations_for_lot(id)?,
            lot,
        }))
    }
}

impl LotRepository for DuckDbLotStore {
    fn lot(&self, id: i64) -> Result<Option<Lot>, LotError> {
        Ok(self.get_lot(id)?)
    }

    fn lots(&self) -> Result<Vec<Lot>, LotError> {
        Ok(self.all_lots()?)
    }

    fn visible_lots(&self) -> Result<Vec<Lot>, LotError> {
        Ok(self.publicly_listed_lots()?)
    }

    fn lot_details(&self, id: i64) -> Result<Option<LotDetails>, LotError> {
        Ok(self.get_lot_details(id)?)
    }

    fn group_members(&self, group_id: i64) -> Result<Vec<Lot>, LotError> {
        Ok(self.members_of(group_id)?)
    }

    fn parcel(&self, id: i64) -> Result<Option<Parcel>, LotError> {
        Ok(self.get_parcel(id)?)
    }

    fn known_use(&self, id: i64) -> Result<Option<Use>, LotError> {
        Ok(self.get_use(id)?)
    }

    fn next_lot_id(&self) -> Result<i64, LotError> {
        Ok(self.max_lot_id_plus_one()?)
    }

    fn save_lot(&mut self, lot: &Lot) -> Result<(), LotError> {
        Ok(self.upsert_lot(lot)?)
    }

    fn save_group(&mut self, group: &LotGroup) -> Result<(), LotError> {
        Ok(self.upsert_lot(&group.lot)?)
    }

    fn delete_lot(&mut self, id: i64) -> Result<(), LotError> {
        Ok(self.remove_lot(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone as _, Utc};
    use geo::{LineString, MultiPolygon, Polygon};
    use living_lots_lot::{group, service};
    use living_lots_lot_models::{License, Violation};

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

    fn lot(id: i64) -> Lot {
        let mut lot = Lot::new(id);
        lot.added = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        lot
    }

    #[test]
    fn lot_rows_round_trip() {
        let store = open_in_memory().unwrap();
        let mut original = lot(1);
        original.name = Some("Corner lot".to_string());
        original.polygon = Some(square(-75.15, 39.98));
        original.centroid = Some(Point::new(-75.149_95, 39.980_05));
        original.known_use_certainty = 9;
        original.owner_id = Some(4);
        original.polygon_area = Some(120.5);

        store.upsert_lot(&original).unwrap();

        assert_eq!(store.get_lot(1).unwrap(), Some(original));
        assert!(store.get_lot(2).unwrap().is_none());
    }

    #[test]
    fn upsert_replaces_existing_row() {
        let store = open_in_memory().unwrap();
        let mut l = lot(1);
        store.upsert_lot(&l).unwrap();
        l.known_use_certainty = 5;
        store.upsert_lot(&l).unwrap();

        assert_eq!(store.all_lots().unwrap().len(), 1);
        assert_eq!(store.get_lot(1).unwrap().unwrap().known_use_certainty, 5);
    }

    #[test]
    fn negative_project_count_is_a_conversion_error() {
        let store = open_in_memory().unwrap();
        store.upsert_lot(&lot(1)).unwrap();
        store
            .connection()
            .execute("UPDATE lots SET steward_project_count = -1 WHERE id = 1", [])
            .unwrap();

        assert!(matches!(store.get_lot(1), Err(DbError::Conversion { .. })));
    }

    #[test]
    fn next_id_follows_max() {
        let store = open_in_memory().unwrap();
        assert_eq!(store.max_lot_id_plus_one().unwrap(), 1);
        store.upsert_lot(&lot(17)).unwrap();
        assert_eq!(store.max_lot_id_plus_one().unwrap(), 18);
    }

    #[test]
    fn listing_filter_matches_visibility_rules() {
        let store = open_in_memory().unwrap();
        store
            .upsert_use(&Use {
                id: 1,
                name: "community garden".to_string(),
                slug: "community-garden".to_string(),
                visible: true,
            })
            .unwrap();
        store
            .upsert_use(&Use {
                id: 2,
                name: "parking lot".to_string(),
                slug: "parking-lot".to_string(),
                visible: false,
            })
            .unwrap();

        let mut no_use = lot(1);
        no_use.known_use_certainty = 8;
        let mut low = lot(2);
        low.known_use_certainty = 3;
        let mut garden_opted_in = lot(3);
        garden_opted_in.known_use_certainty = 8;
        garden_opted_in.known_use_id = Some(1);
        garden_opted_in.steward_inclusion_opt_in = true;
        let mut garden_no_opt_in = lot(4);
        garden_no_opt_in.known_use_certainty = 8;
        garden_no_opt_in.known_use_id = Some(1);
        let mut parking = lot(5);
        parking.known_use_certainty = 8;
        parking.known_use_id = Some(2);
        parking.steward_inclusion_opt_in = true;
        let mut member = lot(6);
        member.known_use_certainty = 8;
        member.group_id = Some(99);
        let mut missing_use = lot(7);
        missing_use.known_use_certainty = 8;
        missing_use.known_use_id = Some(42);
        missing_use.steward_inclusion_opt_in = true;

        for l in [
            &no_use,
            &low,
            &garden_opted_in,
            &garden_no_opt_in,
            &parking,
            &member,
            &missing_use,
        ] {
            store.upsert_lot(l).unwrap();
        }

        let ids: Vec<i64> = store
            .publicly_listed_lots()
            .unwrap()
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn listings_carry_owner_and_availability() {
        let store = open_in_memory().unwrap();
        store
            .upsert_owner(&living_lots_lot_models::Owner {
                id: 2,
                name: "Philadelphia Land Bank".to_string(),
                owner_type: living_lots_lot_models::OwnerType::Public,
            })
            .unwrap();
        store
            .upsert_available_property(&living_lots_lot_models::AvailableProperty {
                id: 5,
                status: "available".to_string(),
            })
            .unwrap();

        let mut owned = lot(1);
        owned.owner_id = Some(2);
        owned.available_property_id = Some(5);
        owned.known_use_certainty = 9;
        let mut hidden = lot(2);
        hidden.owner_id = Some(77);
        store.upsert_lot(&owned).unwrap();
        store.upsert_lot(&hidden).unwrap();

        let all = store.lot_listings(false).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].owner_name.as_deref(), Some("Philadelphia Land Bank"));
        assert!(all[0].is_available);
        assert_eq!(all[1].owner_name, None);
        assert!(!all[1].is_available);

        let public = store.lot_listings(true).unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].lot, owned);
    }

    #[test]
    fn deleting_group_detaches_members_and_links() {
        let mut store = open_in_memory().unwrap();
        store.upsert_lot(&LotGroup::new(10, "Block").lot).unwrap();
        let mut member = lot(1);
        member.group_id = Some(10);
        store.upsert_lot(&member).unwrap();
        store
            .link_license(
                10,
                &License {
                    id: 5,
                    status: "ACTIVE".to_string(),
                },
            )
            .unwrap();

        store.remove_lot(10).unwrap();

        assert!(store.get_lot(10).unwrap().is_none());
        assert_eq!(store.get_lot(1).unwrap().unwrap().group_id, None);
        assert!(store.licenses_for_lot(10).unwrap().is_empty());
    }

    #[test]
    fn details_include_linked_records() {
        let store = open_in_memory().unwrap();
        let mut l = lot(1);
        l.known_use_id = Some(1);
        store.upsert_lot(&l).unwrap();
        store
            .upsert_use(&Use {
                id: 1,
                name: "side yard".to_string(),
                slug: "side-yard".to_string(),
                visible: true,
            })
            .unwrap();
        let when = Utc.with_ymd_and_hms(2024, 2, 10, 8, 15, 0).unwrap();
        store
            .link_violation(
                1,
                &Violation {
                    id: 9,
                    violation_datetime: Some(when),
                },
            )
            .unwrap();

        let details = store.get_lot_details(1).unwrap().unwrap();
        assert_eq!(details.known_use.unwrap().slug, "side-yard");
        assert_eq!(details.violations.len(), 1);
        assert_eq!(details.violations[0].violation_datetime, Some(when));
        assert!(details.owner.is_none());
    }

    #[test]
    fn group_services_run_against_duckdb() {
        let mut store = open_in_memory().unwrap();
        let group = service::create_group(&mut store, "Garden block").unwrap();

        let mut a = lot(group.id() + 1);
        a.polygon = Some(square(0.0, 0.0));
        a.polygon_tied_to_parcel = false;
        a.group_id = Some(group.id());
        let mut b = lot(group.id() + 2);
        b.polygon = Some(square(0.0001, 0.0));
        b.polygon_tied_to_parcel = false;
        b.group_id = Some(group.id());

        service::save_lot(&mut store, &mut a).unwrap();
        service::save_lot(&mut store, &mut b).unwrap();

        let stored = store.group(group.id()).unwrap().unwrap();
        let expected = group::union_polygons([&square(0.0, 0.0), &square(0.0001, 0.0)]);
        assert!(expected.is_some());
        assert_eq!(stored.lot.polygon, expected);
        assert!(stored.lot.centroid.is_some());
        assert_eq!(store.members_of(group.id()).unwrap().len(), 2);
    }
}
