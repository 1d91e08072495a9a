#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Lot, lot group, and linked civic record types.
//!
//! A [`Lot`] is a mapped parcel-like record. Most of what we know about a
//! lot comes from records owned by other city datasets (owners, the water
//! department, L&I licenses and violations, the land use survey, the PRA
//! available property list). Those records are modeled here as plain read
//! only structs and joined onto a lot through [`LotDetails`].

use chrono::{DateTime, Utc};
use geo::{MultiPolygon, Point};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Highest possible known use certainty.
pub const MAX_CERTAINTY: u8 = 10;

/// Status an [`AvailableProperty`] takes once the PRA has taken it off the
/// market.
pub const NO_LONGER_AVAILABLE: &str = "no longer available";

/// License status for licenses currently in force.
pub const LICENSE_STATUS_ACTIVE: &str = "ACTIVE";

/// Land use subcategory for vacant land.
pub const LAND_USE_VACANT: &str = "Vacant";

/// Whether an owner is a private party or a public agency.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OwnerType {
    /// Individuals, companies, and other non-government owners
    Private,
    /// City, state, and federal agencies
    #[default]
    Public,
}

/// The owner of one or more lots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// Primary key.
    pub id: i64,
    /// Owner name, unique across owners.
    pub name: String,
    /// Private or public.
    pub owner_type: OwnerType,
}

/// A named classification of what currently occupies a lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Use {
    /// Primary key.
    #[serde(default)]
    pub id: i64,
    /// Human-readable name (e.g. "community garden").
    pub name: String,
    /// URL-safe identifier.
    pub slug: String,
    /// Whether lots with this use are shown on the public map.
    #[serde(default = "default_visible")]
    pub visible: bool,
}

const fn default_visible() -> bool {
    true
}

/// A lot on the Philadelphia Redevelopment Authority's available property
/// list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableProperty {
    /// Primary key.
    pub id: i64,
    /// Listing status, e.g. `"available"` or `"no longer available"`.
    pub status: String,
}

impl AvailableProperty {
    /// Whether the listing still confirms the property is on the market.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status != NO_LONGER_AVAILABLE
    }
}

/// An area from the city land use survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandUseArea {
    /// Primary key.
    pub id: i64,
    /// Land use subcategory (e.g. `"Vacant"`).
    pub subcategory: Option<String>,
}

/// The Water Department's view of a parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterParcel {
    /// Primary key.
    pub id: i64,
    /// Percentage of the parcel that is permeable, 0 to 100.
    pub percent_permeable: Option<f64>,
    /// Free-text building description (e.g. `"VAC LAND RES"`).
    pub building_description: Option<String>,
    /// Gross parcel area in square feet.
    pub gross_area: Option<f64>,
}

/// An OPA billing account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingAccount {
    /// Primary key.
    pub id: i64,
    /// Land area in square feet.
    pub land_area: Option<f64>,
}

/// A license issued by Licenses & Inspections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Primary key.
    pub id: i64,
    /// License status (e.g. `"ACTIVE"`, `"EXPIRED"`).
    pub status: String,
}

impl License {
    /// Whether the license is currently active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == LICENSE_STATUS_ACTIVE
    }
}

/// A code violation issued by Licenses & Inspections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Primary key.
    pub id: i64,
    /// When the violation was issued.
    pub violation_datetime: Option<DateTime<Utc>>,
}

/// A parcel from the Department of Records parcel layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    /// Primary key.
    pub id: i64,
    /// Parcel outline.
    pub polygon: Option<MultiPolygon<f64>>,
}

/// A mapped parcel-like record.
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    /// Primary key.
    pub id: i64,
    /// Optional display name.
    pub name: Option<String>,
    /// First line of the street address.
    pub address_line1: Option<String>,
    /// Lot outline in WGS84 lon/lat.
    pub polygon: Option<MultiPolygon<f64>>,
    /// Centroid of [`Self::polygon`].
    pub centroid: Option<Point<f64>>,
    pub owner_id: Option<i64>,
    pub billing_account_id: Option<i64>,
    pub tax_account_id: Option<i64>,
    pub parcel_id: Option<i64>,
    pub land_use_area_id: Option<i64>,
    pub available_property_id: Option<i64>,
    pub water_parcel_id: Option<i64>,
    pub known_use_id: Option<i64>,
    /// On a scale of 0 to 10, how certain we are that the known use is
    /// correct.
    pub known_use_certainty: u8,
    /// When set, the known use and its certainty were confirmed by a person
    /// and must not be recomputed.
    pub known_use_locked: bool,
    /// Whether a steward opted in to being included on the map.
    pub steward_inclusion_opt_in: bool,
    /// Number of steward projects attached to this lot.
    pub steward_project_count: u32,
    /// The group this lot belongs to, if any.
    pub group_id: Option<i64>,
    /// Whether this row is itself a [`LotGroup`].
    pub is_group: bool,
    /// Polygon area in square feet.
    pub polygon_area: Option<f64>,
    /// Approximate polygon width in feet.
    pub polygon_width: Option<f64>,
    /// Whether the polygon follows the parcel's polygon on save.
    pub polygon_tied_to_parcel: bool,
    /// When this lot was added.
    pub added: DateTime<Utc>,
}

impl Lot {
    /// Creates a lot with the given id and every optional field empty.
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self {
            id,
            name: None,
            address_line1: None,
            polygon: None,
            centroid: None,
            owner_id: None,
            billing_account_id: None,
            tax_account_id: None,
            parcel_id: None,
            land_use_area_id: None,
            available_property_id: None,
            water_parcel_id: None,
            known_use_id: None,
            known_use_certainty: 0,
            known_use_locked: false,
            steward_inclusion_opt_in: false,
            steward_project_count: 0,
            group_id: None,
            is_group: false,
            polygon_area: None,
            polygon_width: None,
            polygon_tied_to_parcel: true,
            added: Utc::now(),
        }
    }

    /// Name, then street address, then a placeholder built from the id.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.address_line1.as_deref().filter(|s| !s.is_empty()))
            .map_or_else(|| format!("{} (unknown address)", self.id), str::to_string)
    }

    /// Centroid latitude.
    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        self.centroid.map(|c| c.y())
    }

    /// Centroid longitude.
    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        self.centroid.map(|c| c.x())
    }
}

/// A lot that stands for a cluster of member lots.
///
/// The group's polygon and centroid are derived from its members and are
/// only ever written by the group aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct LotGroup {
    /// The group's own lot row.
    pub lot: Lot,
}

impl LotGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        let mut lot = Lot::new(id);
        lot.name = Some(name.into());
        lot.is_group = true;
        Self { lot }
    }

    /// Wraps a stored lot row, returning `None` if it is not a group.
    #[must_use]
    pub fn from_lot(lot: Lot) -> Option<Self> {
        lot.is_group.then_some(Self { lot })
    }

    /// Group id.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.lot.id
    }
}

/// A lot joined with every record linked to it.
#[derive(Debug, Clone, PartialEq)]
pub struct LotDetails {
    pub lot: Lot,
    pub owner: Option<Owner>,
    pub known_use: Option<Use>,
    pub available_property: Option<AvailableProperty>,
    pub land_use_area: Option<LandUseArea>,
    pub water_parcel: Option<WaterParcel>,
    pub billing_account: Option<BillingAccount>,
    pub licenses: Vec<License>,
    pub violations: Vec<Violation>,
}

impl LotDetails {
    /// A lot with no linked records.
    #[must_use]
    pub const fn bare(lot: Lot) -> Self {
        Self {
            lot,
            owner: None,
            known_use: None,
            available_property: None,
            land_use_area: None,
            water_parcel: None,
            billing_account: None,
            licenses: Vec::new(),
            violations: Vec::new(),
        }
    }

    /// Lot area in square feet.
    ///
    /// Prefers the billing account's land area, then the Water
    /// Department's gross area, then the measured polygon area.
    #[must_use]
    pub fn area(&self) -> Option<f64> {
        self.billing_account
            .as_ref()
            .and_then(|b| b.land_area)
            .or_else(|| self.water_parcel.as_ref().and_then(|w| w.gross_area))
            .or(self.lot.polygon_area)
    }

    /// Owner name, or `"unknown"`.
    #[must_use]
    pub fn owner_name(&self) -> &str {
        self.owner.as_ref().map_or("unknown", |o| o.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_address_then_id() {
        let mut lot = Lot::new(42);
        assert_eq!(lot.display_name(), "42 (unknown address)");

        lot.address_line1 = Some("1234 N Front St".to_string());
        assert_eq!(lot.display_name(), "1234 N Front St");

        lot.name = Some("Front Street Garden".to_string());
        assert_eq!(lot.display_name(), "Front Street Garden");
    }

    #[test]
    fn area_prefers_billing_then_water_then_polygon() {
        let mut lot = Lot::new(1);
        lot.polygon_area = Some(900.0);
        let mut details = LotDetails::bare(lot);
        assert_eq!(details.area(), Some(900.0));

        details.water_parcel = Some(WaterParcel {
            id: 1,
            percent_permeable: None,
            building_description: None,
            gross_area: Some(1_100.0),
        });
        assert_eq!(details.area(), Some(1_100.0));

        details.billing_account = Some(BillingAccount {
            id: 1,
            land_area: Some(1_200.0),
        });
        assert_eq!(details.area(), Some(1_200.0));
    }

    #[test]
    fn available_property_status() {
        let mut ap = AvailableProperty {
            id: 1,
            status: "available".to_string(),
        };
        assert!(ap.is_available());
        ap.status = NO_LONGER_AVAILABLE.to_string();
        assert!(!ap.is_available());
    }

    #[test]
    fn group_from_lot_requires_group_flag() {
        assert!(LotGroup::from_lot(Lot::new(1)).is_none());
        let group = LotGroup::new(2, "Block 7");
        assert!(LotGroup::from_lot(group.lot.clone()).is_some());
        assert_eq!(group.id(), 2);
    }

    #[test]
    fn owner_type_round_trips_through_strum() {
        assert_eq!(OwnerType::Private.as_ref(), "private");
        assert_eq!("public".parse::<OwnerType>().unwrap(), OwnerType::Public);
    }
}
