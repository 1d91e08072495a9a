//! HTTP handler functions for the living lots API.

use std::sync::MutexGuard;

use actix_web::{HttpResponse, web};
use geojson::{Feature, FeatureCollection, Geometry, feature::Id};
use living_lots_database::lot_db::{DuckDbLotStore, LotListing};
use living_lots_lot::{
    LotRepository as _, certainty, group,
    nearby::{self, NearbyOptions},
    visibility,
};
use living_lots_server_models::{
    ApiHealth, ApiLot, ApiNearbyLot, ApiUse, LotsQueryParams, NearbyQueryParams,
};

use crate::AppState;

fn internal_error(message: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(serde_json::json!({ "error": message }))
}

fn not_found(id: i64) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": format!("Lot {id} not found")
    }))
}

fn lock_store(state: &AppState) -> Result<MutexGuard<'_, DuckDbLotStore>, HttpResponse> {
    state.store.lock().map_err(|_| {
        log::error!("Lot store mutex poisoned");
        internal_error("Lot store unavailable")
    })
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn to_feature(listing: LotListing) -> Option<Feature> {
    let polygon = listing.lot.polygon.as_ref()?;

    let mut properties = serde_json::Map::new();
    properties.insert("is_available".to_string(), listing.is_available.into());
    properties.insert(
        "owner".to_string(),
        listing
            .owner_name
            .unwrap_or_else(|| "unknown".to_string())
            .into(),
    );

    Some(Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(polygon))),
        id: Some(Id::Number(listing.lot.id.into())),
        properties: Some(properties),
        foreign_members: None,
    })
}

/// `GET /api/lots`
///
/// Returns every lot with a polygon as a `GeoJSON` `FeatureCollection`.
/// With `?visible=true`, only publicly listed lots are included.
pub async fn lots(state: web::Data<AppState>, params: web::Query<LotsQueryParams>) -> HttpResponse {
    let store = match lock_store(&state) {
        Ok(store) => store,
        Err(response) => return response,
    };

    match store.lot_listings(params.visible.unwrap_or(false)) {
        Ok(listings) => {
            let features: Vec<Feature> = listings.into_iter().filter_map(to_feature).collect();
            HttpResponse::Ok().json(FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            })
        }
        Err(e) => {
            log::error!("Failed to query lots: {e}");
            internal_error("Failed to query lots")
        }
    }
}

/// `GET /api/lots/{id}`
pub async fn lot_detail(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    let store = match lock_store(&state) {
        Ok(store) => store,
        Err(response) => return response,
    };

    let details = match store.get_lot_details(id) {
        Ok(Some(details)) => details,
        Ok(None) => return not_found(id),
        Err(e) => {
            log::error!("Failed to query lot {id}: {e}");
            return internal_error("Failed to query lot");
        }
    };

    let number_of_lots = match group::number_of_lots(&*store, &details.lot) {
        Ok(n) => n,
        Err(e) => {
            log::error!("Failed to count members of lot {id}: {e}");
            return internal_error("Failed to query lot");
        }
    };

    let is_visible = visibility::is_visible(&details.lot, details.known_use.as_ref());
    HttpResponse::Ok().json(ApiLot::from_details(&details, is_visible, number_of_lots))
}

/// `GET /api/lots/{id}/certainty`
///
/// How the lot's certainty would be computed right now.
pub async fn certainty_explanation(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> HttpResponse {
    let id = path.into_inner();
    let store = match lock_store(&state) {
        Ok(store) => store,
        Err(response) => return response,
    };

    match store.get_lot_details(id) {
        Ok(Some(details)) => {
            HttpResponse::Ok().json(certainty::explain(&details, chrono::Utc::now()))
        }
        Ok(None) => not_found(id),
        Err(e) => {
            log::error!("Failed to query lot {id}: {e}");
            internal_error("Failed to query lot")
        }
    }
}

/// `GET /api/lots/{id}/nearby`
///
/// Lots whose centroids are within `miles` of the lot's centroid, closest
/// first.
pub async fn nearby(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    params: web::Query<NearbyQueryParams>,
) -> HttpResponse {
    let id = path.into_inner();
    let store = match lock_store(&state) {
        Ok(store) => store,
        Err(response) => return response,
    };

    let lot = match store.lot(id) {
        Ok(Some(lot)) => lot,
        Ok(None) => return not_found(id),
        Err(e) => {
            log::error!("Failed to query lot {id}: {e}");
            return internal_error("Failed to query lot");
        }
    };

    let defaults = NearbyOptions::default();
    let options = NearbyOptions {
        miles: params.miles.unwrap_or(defaults.miles),
        count: params.count.unwrap_or(defaults.count),
        visible_only: params.visible.unwrap_or(defaults.visible_only),
        include_self: false,
    };

    match nearby::find_nearby(&*store, &lot, &options) {
        Ok(found) => {
            let lots: Vec<ApiNearbyLot> = found
                .into_iter()
                .map(|n| ApiNearbyLot {
                    id: n.lot.id,
                    display_name: n.lot.display_name(),
                    latitude: n.lot.latitude(),
                    longitude: n.lot.longitude(),
                    distance_miles: n.distance_miles,
                })
                .collect();
            HttpResponse::Ok().json(lots)
        }
        Err(e) => {
            log::error!("Failed to find lots near {id}: {e}");
            internal_error("Failed to find nearby lots")
        }
    }
}

/// `GET /api/uses`
pub async fn uses(state: web::Data<AppState>) -> HttpResponse {
    let store = match lock_store(&state) {
        Ok(store) => store,
        Err(response) => return response,
    };

    match store.uses() {
        Ok(uses) => {
            let uses: Vec<ApiUse> = uses.into_iter().map(ApiUse::from).collect();
            HttpResponse::Ok().json(uses)
        }
        Err(e) => {
            log::error!("Failed to query uses: {e}");
            internal_error("Failed to query uses")
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test, web};
    use geo::{LineString, MultiPolygon, Polygon};
    use living_lots_database::lot_db;
    use living_lots_lot::{registry, service};
    use living_lots_lot_models::{AvailableProperty, Lot, Owner, OwnerType};

    use crate::{AppState, configure};

    fn square(x: f64, y: f64) -> MultiPolygon<f64> {
        let size = 0.0002;
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

    fn lot(id: i64, certainty: u8, polygon: Option<MultiPolygon<f64>>) -> Lot {
        let mut lot = Lot::new(id);
        lot.known_use_certainty = certainty;
        lot.polygon = polygon;
        lot.polygon_tied_to_parcel = false;
        lot
    }

    fn state() -> web::Data<AppState> {
        let mut store = lot_db::open_in_memory().unwrap();
        store.seed_uses(&registry::default_uses()).unwrap();
        store
            .upsert_owner(&Owner {
                id: 2,
                name: "Philadelphia Land Bank".to_string(),
                owner_type: OwnerType::Public,
            })
            .unwrap();
        store
            .upsert_available_property(&AvailableProperty {
                id: 5,
                status: "available".to_string(),
            })
            .unwrap();

        let mut listed = lot(1, 8, Some(square(-75.1500, 39.9800)));
        listed.owner_id = Some(2);
        listed.available_property_id = Some(5);
        let mut hidden = lot(2, 2, Some(square(-75.1495, 39.9800)));
        let mut no_polygon = lot(3, 8, None);
        for l in [&mut listed, &mut hidden, &mut no_polygon] {
            service::save_lot(&mut store, l).unwrap();
        }

        let group = service::create_group(&mut store, "Norris Square block").unwrap();
        let mut member = lot(group.id() + 1, 8, Some(square(-75.1490, 39.9800)));
        member.group_id = Some(group.id());
        service::save_lot(&mut store, &mut member).unwrap();

        web::Data::new(AppState::new(store))
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn lots_geojson_includes_every_lot_with_a_polygon() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/lots").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["type"], "FeatureCollection");
        let features = body["features"].as_array().unwrap();
        // lots 1, 2, the group, and its member; lot 3 has no polygon
        assert_eq!(features.len(), 4);

        let first = &features[0];
        assert_eq!(first["id"], 1);
        assert_eq!(first["geometry"]["type"], "MultiPolygon");
        assert_eq!(first["properties"]["owner"], "Philadelphia Land Bank");
        assert_eq!(first["properties"]["is_available"], true);
        assert_eq!(features[1]["properties"]["owner"], "unknown");
        assert_eq!(features[1]["properties"]["is_available"], false);
    }

    #[actix_web::test]
    async fn visible_filter_applies_listing_rules() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get()
            .uri("/api/lots?visible=true")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let ids: Vec<i64> = body["features"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|f| f["id"].as_i64())
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[actix_web::test]
    async fn lot_detail_reports_group_size_and_visibility() {
        let data = state();
        let group_id = 4;
        let app = test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/lots/{group_id}"))
            .to_request();
        let group: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(group["isGroup"], true);
        assert_eq!(group["numberOfLots"], 1);
        assert_eq!(group["displayName"], "Norris Square block");
        assert!(group["latitude"].as_f64().is_some());

        let req = test::TestRequest::get().uri("/api/lots/1").to_request();
        let single: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(single["numberOfLots"], 1);
        assert_eq!(single["isVisible"], true);
        assert_eq!(single["isAvailable"], true);
        assert_eq!(single["knownUseCertainty"], 8);
    }

    #[actix_web::test]
    async fn missing_lot_is_not_found() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/lots/999").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/api/lots/999/nearby")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn nearby_excludes_the_lot_itself() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get()
            .uri("/api/lots/1/nearby?visible=false&count=10")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let ids: Vec<i64> = body
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|n| n["id"].as_i64())
            .collect();
        assert!(!ids.contains(&1));
        assert!(!ids.contains(&3));
        assert_eq!(ids.first(), Some(&2));
        assert!(body[0]["distanceMiles"].as_f64().unwrap() < 0.1);
    }

    #[actix_web::test]
    async fn certainty_explanation_lists_contributions() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get()
            .uri("/api/lots/1/certainty")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["basis"], "available_property");
        assert_eq!(body["certainty"], 10);
        assert!(body["contributions"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn uses_lists_seeded_uses() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/uses").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(
            body.as_array().unwrap().len(),
            registry::default_uses().len()
        );
    }
}
