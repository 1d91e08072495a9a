//! Reference records linked to lots.
//!
//! Importers load owners, parcels, land use areas, and the rest with the
//! `upsert_*` methods; the lookups feed [`DuckDbLotStore::get_lot_details`].

use living_lots_lot_models::{
    AvailableProperty, BillingAccount, LandUseArea, License, Owner, OwnerType, Parcel, Use,
    Violation, WaterParcel,
};

use crate::{DbError, geometry, lot_db::DuckDbLotStore, lot_db::optional};

impl DuckDbLotStore {
    /// Inserts any of `uses` whose id is not already stored.
    ///
    /// Returns the number of uses inserted.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any insert fails.
    pub fn seed_uses(&self, uses: &[Use]) -> Result<usize, DbError> {
        let mut inserted = 0;
        for known_use in uses {
            let changed = self.connection().execute(
                "INSERT OR IGNORE INTO uses (id, name, slug, visible) VALUES (?, ?, ?, ?)",
                duckdb::params![
                    known_use.id,
                    known_use.name,
                    known_use.slug,
                    known_use.visible
                ],
            )?;
            inserted += changed;
        }

        log::info!("Seeded {inserted} of {} uses", uses.len());
        Ok(inserted)
    }

    /// Inserts or replaces a use.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write fails.
    pub fn upsert_use(&self, known_use: &Use) -> Result<(), DbError> {
        self.connection().execute(
            "INSERT OR REPLACE INTO uses (id, name, slug, visible) VALUES (?, ?, ?, ?)",
            duckdb::params![
                known_use.id,
                known_use.name,
                known_use.slug,
                known_use.visible
            ],
        )?;
        Ok(())
    }

    /// Lists every use ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn uses(&self) -> Result<Vec<Use>, DbError> {
        let mut stmt = self
            .connection()
            .prepare("SELECT id, name, slug, visible FROM uses ORDER BY name")?;
        let mut rows = stmt.query([])?;

        let mut uses = Vec::new();
        while let Some(row) = rows.next()? {
            uses.push(Use {
                id: row.get(0)?,
                name: row.get(1)?,
                slug: row.get(2)?,
                visible: row.get(3)?,
            });
        }

        Ok(uses)
    }

    /// Fetches a use.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn get_use(&self, id: i64) -> Result<Option<Use>, DbError> {
        optional(self.connection().query_row(
            "SELECT id, name, slug, visible FROM uses WHERE id = ?",
            duckdb::params![id],
            |row| {
                Ok(Use {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    slug: row.get(2)?,
                    visible: row.get(3)?,
                })
            },
        ))
    }

    /// Inserts or replaces an owner.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write fails.
    pub fn upsert_owner(&self, owner: &Owner) -> Result<(), DbError> {
        self.connection().execute(
            "INSERT OR REPLACE INTO owners (id, name, owner_type) VALUES (?, ?, ?)",
            duckdb::params![owner.id, owner.name, owner.owner_type.as_ref()],
        )?;
        Ok(())
    }

    /// Fetches an owner.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or the stored owner type is
    /// not recognized.
    pub fn owner(&self, id: i64) -> Result<Option<Owner>, DbError> {
        let row = optional(self.connection().query_row(
            "SELECT id, name, owner_type FROM owners WHERE id = ?",
            duckdb::params![id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        ))?;

        row.map(|(id, name, owner_type)| {
            let owner_type =
                owner_type
                    .parse::<OwnerType>()
                    .map_err(|e| DbError::Conversion {
                        message: format!("Owner {id} has unknown type {owner_type}: {e}"),
                    })?;
            Ok(Owner {
                id,
                name,
                owner_type,
            })
        })
        .transpose()
    }

    /// Inserts or replaces an available property listing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write fails.
    pub fn upsert_available_property(&self, property: &AvailableProperty) -> Result<(), DbError> {
        self.connection().execute(
            "INSERT OR REPLACE INTO available_properties (id, status) VALUES (?, ?)",
            duckdb::params![property.id, property.status],
        )?;
        Ok(())
    }

    /// Fetches an available property listing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn available_property(&self, id: i64) -> Result<Option<AvailableProperty>, DbError> {
        optional(self.connection().query_row(
            "SELECT id, status FROM available_properties WHERE id = ?",
            duckdb::params![id],
            |row| {
                Ok(AvailableProperty {
                    id: row.get(0)?,
                    status: row.get(1)?,
                })
            },
        ))
    }

    /// Inserts or replaces a land use area.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write fails.
    pub fn upsert_land_use_area(&self, area: &LandUseArea) -> Result<(), DbError> {
        self.connection().execute(
            "INSERT OR REPLACE INTO land_use_areas (id, subcategory) VALUES (?, ?)",
            duckdb::params![area.id, area.subcategory],
        )?;
        Ok(())
    }

    /// Fetches a land use area.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn land_use_area(&self, id: i64) -> Result<Option<LandUseArea>, DbError> {
        optional(self.connection().query_row(
            "SELECT id, subcategory FROM land_use_areas WHERE id = ?",
            duckdb::params![id],
            |row| {
                Ok(LandUseArea {
                    id: row.get(0)?,
                    subcategory: row.get(1)?,
                })
            },
        ))
    }

    /// Inserts or replaces a water department parcel.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write fails.
    pub fn upsert_water_parcel(&self, parcel: &WaterParcel) -> Result<(), DbError> {
        self.connection().execute(
            "INSERT OR REPLACE INTO water_parcels
                (id, percent_permeable, building_description, gross_area)
             VALUES (?, ?, ?, ?)",
            duckdb::params![
                parcel.id,
                parcel.percent_permeable,
                parcel.building_description,
                parcel.gross_area
            ],
        )?;
        Ok(())
    }

    /// Fetches a water department parcel.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn water_parcel(&self, id: i64) -> Result<Option<WaterParcel>, DbError> {
        optional(self.connection().query_row(
            "SELECT id, percent_permeable, building_description, gross_area
             FROM water_parcels WHERE id = ?",
            duckdb::params![id],
            |row| {
                Ok(WaterParcel {
                    id: row.get(0)?,
                    percent_permeable: row.get(1)?,
                    building_description: row.get(2)?,
                    gross_area: row.get(3)?,
                })
            },
        ))
    }

    /// Inserts or replaces a billing account.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write fails.
    pub fn upsert_billing_account(&self, account: &BillingAccount) -> Result<(), DbError> {
        self.connection().execute(
            "INSERT OR REPLACE INTO billing_accounts (id, land_area) VALUES (?, ?)",
            duckdb::params![account.id, account.land_area],
        )?;
        Ok(())
    }

    /// Fetches a billing account.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn billing_account(&self, id: i64) -> Result<Option<BillingAccount>, DbError> {
        optional(self.connection().query_row(
            "SELECT id, land_area FROM billing_accounts WHERE id = ?",
            duckdb::params![id],
            |row| {
                Ok(BillingAccount {
                    id: row.get(0)?,
                    land_area: row.get(1)?,
                })
            },
        ))
    }

    /// Inserts or replaces a parcel.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if serialization or the write fails.
    pub fn upsert_parcel(&self, parcel: &Parcel) -> Result<(), DbError> {
        let polygon = geometry::encode_column(parcel.polygon.as_ref())?;
        self.connection().execute(
            "INSERT OR REPLACE INTO parcels (id, polygon) VALUES (?, ?)",
            duckdb::params![parcel.id, polygon],
        )?;
        Ok(())
    }

    /// Fetches a parcel.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn get_parcel(&self, id: i64) -> Result<Option<Parcel>, DbError> {
        let row = optional(self.connection().query_row(
            "SELECT id, polygon FROM parcels WHERE id = ?",
            duckdb::params![id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?)),
        ))?;

        Ok(row.map(|(id, polygon)| Parcel {
            id,
            polygon: geometry::decode_column(id, polygon),
        }))
    }

    /// Stores a license and links it to a lot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if either write fails.
    pub fn link_license(&self, lot_id: i64, license: &License) -> Result<(), DbError> {
        let conn = self.connection();
        conn.execute(
            "INSERT OR REPLACE INTO licenses (id, status) VALUES (?, ?)",
            duckdb::params![license.id, license.status],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO lot_licenses (lot_id, license_id) VALUES (?, ?)",
            duckdb::params![lot_id, license.id],
        )?;
        Ok(())
    }

    /// Licenses linked to a lot, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn licenses_for_lot(&self, lot_id: i64) -> Result<Vec<License>, DbError> {
        let mut stmt = self.connection().prepare(
            "SELECT l.id, l.status FROM licenses l
             JOIN lot_licenses ll ON ll.license_id = l.id
             WHERE ll.lot_id = ?
             ORDER BY l.id",
        )?;
        let mut rows = stmt.query(duckdb::params![lot_id])?;

        let mut licenses = Vec::new();
        while let Some(row) = rows.next()? {
            licenses.push(License {
                id: row.get(0)?,
                status: row.get(1)?,
            });
        }

        Ok(licenses)
    }

    /// Stores a violation and links it to a lot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if either write fails.
    pub fn link_violation(&self, lot_id: i64, violation: &Violation) -> Result<(), DbError> {
        let conn = self.connection();
        let when = violation
            .violation_datetime
            .as_ref()
            .map(crate::format_timestamp);
        conn.execute(
            "INSERT OR REPLACE INTO violations (id, violation_datetime)
             VALUES (?, CAST(? AS TIMESTAMP))",
            duckdb::params![violation.id, when],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO lot_violations (lot_id, violation_id) VALUES (?, ?)",
            duckdb::params![lot_id, violation.id],
        )?;
        Ok(())
    }

    /// Violations linked to a lot, ordered by id.
    ///
    /// Unparseable timestamps are read as missing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn violations_for_lot(&self, lot_id: i64) -> Result<Vec<Violation>, DbError> {
        let mut stmt = self.connection().prepare(
            "SELECT v.id, v.violation_datetime::TEXT FROM violations v
             JOIN lot_violations lv ON lv.violation_id = v.id
             WHERE lv.lot_id = ?
             ORDER BY v.id",
        )?;
        let mut rows = stmt.query(duckdb::params![lot_id])?;

        let mut violations = Vec::new();
        while let Some(row) = rows.next()? {
            let when: Option<String> = row.get(1)?;
            violations.push(Violation {
                id: row.get(0)?,
                violation_datetime: when.as_deref().and_then(crate::parse_timestamp),
            });
        }

        Ok(violations)
    }
}
