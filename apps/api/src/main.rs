//! Tollgate API gateway composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;
mod upstream;

use std::net::SocketAddr;

use tollgate_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_services::{AdmissionStores, build_app_runtime};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let stores = AdmissionStores::from_config(&config.admission_store)?;
    let runtime = build_app_runtime(&config, stores)?;

    tokio::spawn(runtime.pipeline.run(runtime.receiver));

    let app = api_router::build_router(runtime.state);
    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, upstream = %config.upstream_base_url, "tollgate-api listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
