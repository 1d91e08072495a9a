//! Lot polygon measurements in feet.
//!
//! Lot polygons are stored in WGS84 lon/lat. Areas are geodesic on the
//! WGS84 ellipsoid, distances use the haversine formula. Anything that
//! cannot be measured (empty or non-finite geometry, latitudes outside the
//! valid range) measures as `None`.

use geo::{
    Centroid, ConvexHull, CoordsIter, Distance, GeodesicArea, Haversine, MultiPolygon, Orient,
    Point, orient::Direction,
};
use living_lots_lot_models::Lot;

const FEET_PER_METER: f64 = 3.280_839_895;

const SQUARE_FEET_PER_SQUARE_METER: f64 = FEET_PER_METER * FEET_PER_METER;

const METERS_PER_MILE: f64 = 1_609.344;

/// Whether the geometry has at least one coordinate and every coordinate
/// is finite.
#[must_use]
pub fn is_measurable(polygon: &MultiPolygon<f64>) -> bool {
    polygon.coords_count() > 0
        && polygon
            .coords_iter()
            .all(|c| c.x.is_finite() && c.y.is_finite())
}

fn is_lon_lat(polygon: &MultiPolygon<f64>) -> bool {
    is_measurable(polygon) && polygon.coords_iter().all(|c| (-90.0..=90.0).contains(&c.y))
}

/// Area of the polygon in square feet.
#[must_use]
pub fn polygon_area(polygon: &MultiPolygon<f64>) -> Option<f64> {
    if !is_lon_lat(polygon) {
        return None;
    }

    // Unsigned geodesic area assumes counter-clockwise exteriors.
    let square_meters = polygon
        .orient(Direction::Default)
        .geodesic_area_unsigned();

    square_meters
        .is_finite()
        .then_some(square_meters * SQUARE_FEET_PER_SQUARE_METER)
}

/// Approximate width (narrowest side) of the polygon in feet.
///
/// Walks the sides of the convex hull, finds the longest, then picks the
/// side whose product with the longest side comes closest to the
/// polygon's actual area.
#[must_use]
pub fn polygon_width(polygon: &MultiPolygon<f64>) -> Option<f64> {
    let target_area = polygon_area(polygon)?;

    let hull = polygon.convex_hull();
    let sides: Vec<f64> = hull
        .exterior()
        .lines()
        .map(|line| Haversine.distance(Point(line.start), Point(line.end)) * FEET_PER_METER)
        .collect();

    let longest = sides.iter().copied().fold(None, |best: Option<f64>, side| {
        Some(best.map_or(side, |b| b.max(side)))
    })?;

    let closest = sides.iter().copied().fold(longest, |closest, side| {
        if (target_area - side * longest).abs() < (target_area - closest * longest).abs() {
            side
        } else {
            closest
        }
    });

    Some(closest)
}

/// Great-circle distance between two lon/lat points in miles.
#[must_use]
pub fn distance_miles(a: Point<f64>, b: Point<f64>) -> f64 {
    Haversine.distance(a, b) / METERS_PER_MILE
}

/// Recomputes a lot's centroid, area, and width from its polygon.
pub fn refresh_derived_geometry(lot: &mut Lot) {
    match &lot.polygon {
        Some(polygon) if is_measurable(polygon) => {
            lot.centroid = polygon.centroid();
            lot.polygon_area = polygon_area(polygon);
            lot.polygon_width = polygon_width(polygon);
        }
        Some(_) => {
            log::warn!("Lot {} has an unmeasurable polygon", lot.id);
            lot.centroid = None;
            lot.polygon_area = None;
            lot.polygon_width = None;
        }
        None => {
            lot.polygon_area = None;
            lot.polygon_width = None;
        }
    }
}
