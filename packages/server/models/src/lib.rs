#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the living lots server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the lot record types to allow independent evolution of the API
//! contract.

use chrono::{DateTime, Utc};
use living_lots_lot_models::{LotDetails, Use};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// A known use classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub visible: bool,
}

impl From<Use> for ApiUse {
    fn from(u: Use) -> Self {
        Self {
            id: u.id,
            name: u.name,
            slug: u.slug,
            visible: u.visible,
        }
    }
}

/// A lot as returned by the detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLot {
    /// Lot ID.
    pub id: i64,
    /// Name, address, or placeholder.
    pub display_name: String,
    /// Street address.
    pub address_line1: Option<String>,
    /// Owner name, or `"unknown"`.
    pub owner: String,
    /// What the lot is believed to be used for.
    pub known_use: Option<ApiUse>,
    /// Confidence in the known use (0-10).
    pub known_use_certainty: u8,
    /// Whether the certainty is set by hand.
    pub known_use_locked: bool,
    /// Whether the lot may be shown publicly.
    pub is_visible: bool,
    /// Whether an available property listing is linked.
    pub is_available: bool,
    /// Area in square feet.
    pub area: Option<f64>,
    /// Approximate narrowest width in feet.
    pub polygon_width: Option<f64>,
    /// Member count for groups, 1 otherwise.
    pub number_of_lots: usize,
    /// Centroid latitude.
    pub latitude: Option<f64>,
    /// Centroid longitude.
    pub longitude: Option<f64>,
    /// Group this lot belongs to.
    pub group_id: Option<i64>,
    /// Whether this lot is a lot group.
    pub is_group: bool,
    /// When the lot was added.
    pub added: DateTime<Utc>,
}

impl ApiLot {
    /// Builds the API view of a lot from its joined details.
    #[must_use]
    pub fn from_details(details: &LotDetails, is_visible: bool, number_of_lots: usize) -> Self {
        let lot = &details.lot;
        Self {
            id: lot.id,
            display_name: lot.display_name(),
            address_line1: lot.address_line1.clone(),
            owner: details.owner_name().to_string(),
            known_use: details.known_use.clone().map(ApiUse::from),
            known_use_certainty: lot.known_use_certainty,
            known_use_locked: lot.known_use_locked,
            is_visible,
            is_available: details.available_property.is_some(),
            area: details.area(),
            polygon_width: lot.polygon_width,
            number_of_lots,
            latitude: lot.latitude(),
            longitude: lot.longitude(),
            group_id: lot.group_id,
            is_group: lot.is_group,
            added: lot.added,
        }
    }
}

/// A lot near another lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNearbyLot {
    pub id: i64,
    pub display_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Centroid distance from the requested lot.
    pub distance_miles: f64,
}

/// Query parameters for the lot listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotsQueryParams {
    /// Only return lots that pass the public listing filter.
    pub visible: Option<bool>,
}

/// Query parameters for the nearby lots endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQueryParams {
    /// Maximum number of lots (default 5).
    pub count: Option<usize>,
    /// Search radius in miles (default 0.5).
    pub miles: Option<f64>,
    /// Only consider publicly listed lots (default true).
    pub visible: Option<bool>,
}
