//! Known use certainty estimation.
//!
//! Scores, on a scale of 0 to 10, how confident we are that a lot's known
//! use is accurate. Only two things yield real certainty: a person locking
//! the known use, or the lot being on the PRA's available property list.
//! Everything else is a fuzzy sum of capped contributions from the city
//! datasets linked to the lot, and never reaches 10.

use chrono::{DateTime, Duration, Utc};
use living_lots_lot_models::{LAND_USE_VACANT, LotDetails, MAX_CERTAINTY};
use serde::Serialize;
use strum_macros::{AsRefStr, Display};

/// Highest score the fuzzy contributions can add up to.
pub const MAX_FUZZY_CERTAINTY: u8 = 9;

/// How far back a code violation still counts as evidence.
pub const VIOLATION_WINDOW_DAYS: i64 = 365;

/// Building description prefixes the Water Department uses for empty land.
const VACANT_DESCRIPTION_PREFIXES: &[&str] = &["vac land", "vacant"];

/// A named source of fuzzy evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContributionKind {
    /// The land use survey marks the lot vacant.
    VacantLandUse,
    /// L&I has issued active licenses for the lot.
    ActiveLicenses,
    /// L&I has issued violations for the lot in the past year.
    RecentViolations,
    /// The Water Department reports the lot as permeable.
    WaterPermeability,
    /// The Water Department describes the lot as having no buildings.
    WaterVacantDescription,
}

/// One row of the contribution table.
struct Contribution {
    kind: ContributionKind,
    cap: u8,
    score: fn(&LotDetails, DateTime<Utc>) -> u32,
}

const CONTRIBUTIONS: &[Contribution] = &[
    Contribution {
        kind: ContributionKind::VacantLandUse,
        cap: 4,
        score: vacant_land_use,
    },
    Contribution {
        kind: ContributionKind::ActiveLicenses,
        cap: 4,
        score: active_licenses,
    },
    Contribution {
        kind: ContributionKind::RecentViolations,
        cap: 4,
        score: recent_violations,
    },
    Contribution {
        kind: ContributionKind::WaterPermeability,
        cap: 5,
        score: water_permeability,
    },
    Contribution {
        kind: ContributionKind::WaterVacantDescription,
        cap: 4,
        score: water_vacant_description,
    },
];

/// Points one contribution added to a lot's fuzzy score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredContribution {
    /// Which rule produced the points.
    pub kind: ContributionKind,
    /// Points after applying the cap.
    pub points: u8,
    /// Most points this rule can ever add.
    pub cap: u8,
}

/// Why a lot ended up with its certainty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CertaintyBasis {
    /// Someone locked the known use; the stored value stands.
    Locked,
    /// The lot is on the available property list.
    AvailableProperty,
    /// Sum of fuzzy contributions.
    Fuzzy,
}

/// A certainty score together with how it was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertaintyExplanation {
    pub certainty: u8,
    pub basis: CertaintyBasis,
    /// Empty unless `basis` is [`CertaintyBasis::Fuzzy`].
    pub contributions: Vec<ScoredContribution>,
}

/// Estimates how certain we are that the lot's known use is correct.
///
/// Pure function of the lot's current linked records; the caller persists
/// the result into `known_use_certainty`.
#[must_use]
pub fn estimate(details: &LotDetails, now: DateTime<Utc>) -> u8 {
    explain(details, now).certainty
}

/// Like [`estimate`], but reports which rule decided the score and each
/// contribution's share of a fuzzy score.
#[must_use]
pub fn explain(details: &LotDetails, now: DateTime<Utc>) -> CertaintyExplanation {
    if details.lot.known_use_locked {
        return CertaintyExplanation {
            certainty: details.lot.known_use_certainty,
            basis: CertaintyBasis::Locked,
            contributions: Vec::new(),
        };
    }

    if details
        .available_property
        .as_ref()
        .is_some_and(living_lots_lot_models::AvailableProperty::is_available)
    {
        return CertaintyExplanation {
            certainty: MAX_CERTAINTY,
            basis: CertaintyBasis::AvailableProperty,
            contributions: Vec::new(),
        };
    }

    let contributions = contributions(details, now);
    let total: u32 = contributions.iter().map(|c| u32::from(c.points)).sum();
    let certainty = u8::try_from(total.min(u32::from(MAX_FUZZY_CERTAINTY)))
        .unwrap_or(MAX_FUZZY_CERTAINTY);

    CertaintyExplanation {
        certainty,
        basis: CertaintyBasis::Fuzzy,
        contributions,
    }
}

/// Evaluates every fuzzy contribution, capped, ignoring lock and
/// available property status.
#[must_use]
pub fn contributions(details: &LotDetails, now: DateTime<Utc>) -> Vec<ScoredContribution> {
    CONTRIBUTIONS
        .iter()
        .map(|c| {
            let raw = (c.score)(details, now);
            let points = u8::try_from(raw.min(u32::from(c.cap))).unwrap_or(c.cap);
            ScoredContribution {
                kind: c.kind,
                points,
                cap: c.cap,
            }
        })
        .collect()
}

fn vacant_land_use(details: &LotDetails, _now: DateTime<Utc>) -> u32 {
    let vacant = details
        .land_use_area
        .as_ref()
        .and_then(|area| area.subcategory.as_deref())
        == Some(LAND_USE_VACANT);
    if vacant { 4 } else { 0 }
}

fn active_licenses(details: &LotDetails, _now: DateTime<Utc>) -> u32 {
    let active = details.licenses.iter().filter(|l| l.is_active()).count();
    u32::try_from(active).unwrap_or(u32::MAX).saturating_mul(2)
}

fn recent_violations(details: &LotDetails, now: DateTime<Utc>) -> u32 {
    let cutoff = now - Duration::days(VIOLATION_WINDOW_DAYS);
    let recent = details
        .violations
        .iter()
        .filter(|v| v.violation_datetime.is_some_and(|dt| dt > cutoff))
        .count();
    u32::try_from(recent).unwrap_or(u32::MAX).saturating_mul(2)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn water_permeability(details: &LotDetails, _now: DateTime<Utc>) -> u32 {
    let Some(percent) = details
        .water_parcel
        .as_ref()
        .and_then(|w| w.percent_permeable)
    else {
        return 0;
    };

    if !percent.is_finite() || percent <= 0.0 {
        return 0;
    }

    (percent.min(100.0) / 20.0).floor() as u32
}

fn water_vacant_description(details: &LotDetails, _now: DateTime<Utc>) -> u32 {
    let Some(description) = details
        .water_parcel
        .as_ref()
        .and_then(|w| w.building_description.as_deref())
    else {
        return 0;
    };

    let description = description.to_lowercase();
    if VACANT_DESCRIPTION_PREFIXES
        .iter()
        .any(|prefix| description.starts_with(prefix))
    {
        4
    } else {
        0
    }
}
