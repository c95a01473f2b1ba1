use axum::{middleware::from_fn, routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::auth;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::products;
use super::state::AppState;
use super::users;

/// Create the full API router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        // Probes
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Registration, login and refresh sessions
        .nest("/auth", auth::create_auth_router())
        // Per-user address book
        .nest("/users", users::create_user_router(state.clone()))
        // Public catalogue with admin-only writes
        .nest("/products", products::create_product_router(state.clone()))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(logging_middleware))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
