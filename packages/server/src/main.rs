#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Living lots API server binary.

#[actix_web::main]
async fn main() -> Result<(), living_lots_server::ServerError> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    if let Err(e) = living_lots_server::run_server().await {
        log::error!("Server failed: {e}");
        return Err(e);
    }

    Ok(())
}
