use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{MethodRouter, any, get};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState) -> Router {
    build_router_with_upstream(app_state, any(handlers::gateway::forward_handler))
}

/// Mounts `upstream` behind the admission gate. Everything else is
/// operational surface and is never counted.
pub fn build_router_with_upstream(
    app_state: AppState,
    upstream: MethodRouter<AppState>,
) -> Router {
    let gated_routes = Router::new()
        .route("/api/properties", upstream.clone())
        .route("/api/properties/{*rest}", upstream)
        .route_layer(from_fn_with_state(app_state.clone(), middleware::admission));

    let admin_routes = Router::new()
        .route(
            "/api/admin/policies",
            get(handlers::admin::policies_handler),
        )
        .route(
            "/api/admin/analytics",
            get(handlers::admin::analytics_handler),
        )
        .route(
            "/api/admin/violations",
            get(handlers::admin::violations_handler),
        )
        .route(
            "/api/admin/anomalies",
            get(handlers::admin::anomalies_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_admin,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(admin_routes)
        .merge(gated_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests;
