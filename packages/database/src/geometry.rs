//! GeoJSON text encoding for stored polygons.
//!
//! Polygons are kept in `TEXT` columns as GeoJSON geometry objects. Reads
//! accept either a `Polygon` or a `MultiPolygon`; writes always produce a
//! `MultiPolygon`.

use geo::MultiPolygon;
use geojson::GeoJson;

use crate::DbError;

/// Parses a GeoJSON geometry string into a [`MultiPolygon`].
///
/// Returns `None` for anything that is not a polygonal geometry.
#[must_use]
pub fn parse_multipolygon(geojson_str: &str) -> Option<MultiPolygon<f64>> {
    let geojson: GeoJson = geojson_str.parse().ok()?;
    if let GeoJson::Geometry(geom) = geojson {
        let geo_geom: geo::Geometry<f64> = geom.try_into().ok()?;
        match geo_geom {
            geo::Geometry::MultiPolygon(mp) => Some(mp),
            geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
            _ => None,
        }
    } else {
        None
    }
}

/// Reads an optional stored polygon column, logging unparseable values.
pub(crate) fn decode_column(lot_id: i64, value: Option<String>) -> Option<MultiPolygon<f64>> {
    let text = value?;
    let polygon = parse_multipolygon(&text);
    if polygon.is_none() {
        log::warn!("Ignoring unparseable polygon stored for row {lot_id}");
    }
    polygon
}

/// Serializes a [`MultiPolygon`] as a GeoJSON geometry string.
///
/// # Errors
///
/// Returns [`DbError::Json`] if serialization fails.
pub fn to_geojson(polygon: &MultiPolygon<f64>) -> Result<String, DbError> {
    let geometry = geojson::Geometry::new(geojson::Value::from(polygon));
    Ok(serde_json::to_string(&geometry)?)
}

/// Serializes an optional polygon for binding.
///
/// # Errors
///
/// Returns [`DbError::Json`] if serialization fails.
pub(crate) fn encode_column(polygon: Option<&MultiPolygon<f64>>) -> Result<Option<String>, DbError> {
    polygon.map(to_geojson).transpose()
}
