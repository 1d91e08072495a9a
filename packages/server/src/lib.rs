#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the living lots map.
//!
//! Serves the lot `GeoJSON` layer, lot details, nearby lot lookups, and the
//! known use list from the `DuckDB` lot database.

pub mod config;
mod handlers;

use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use living_lots_database::{DbError, lot_db, lot_db::DuckDbLotStore};
use living_lots_lot::registry;

pub use config::{ConfigError, ServerConfig};

/// Errors that stop the server from starting or running.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Bad configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The lot database could not be opened or prepared.
    #[error(transparent)]
    Database(#[from] DbError),

    /// The HTTP server failed to bind or run.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// Lot database. `duckdb::Connection` is `Send` but not `Sync`, so a
    /// `Mutex` is needed.
    pub store: Mutex<DuckDbLotStore>,
}

impl AppState {
    #[must_use]
    pub const fn new(store: DuckDbLotStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/lots", web::get().to(handlers::lots))
            .route("/lots/{id}", web::get().to(handlers::lot_detail))
            .route("/lots/{id}/nearby", web::get().to(handlers::nearby))
            .route(
                "/lots/{id}/certainty",
                web::get().to(handlers::certainty_explanation),
            )
            .route("/uses", web::get().to(handlers::uses)),
    );
}

/// Starts the living lots API server.
///
/// Opens the lot database (creating the schema and default uses if
/// needed) and runs the Actix-Web HTTP server until it stops. The caller
/// provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the configuration is invalid, the database
/// cannot be opened, or the server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    let config = ServerConfig::from_env()?;

    log::info!("Opening lot database at {}...", config.db_path.display());
    let store = lot_db::open(&config.db_path)?;
    store.seed_uses(&registry::default_uses())?;

    let state = web::Data::new(AppState::new(store));

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
