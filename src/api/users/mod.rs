//! Address book of the authenticated user

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};

use crate::api::middleware::{authenticate, CurrentUser};
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::account::{Address, NewAddress};

/// Create the user router; every route requires an access token
pub fn create_user_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me/addresses", get(list_addresses).post(add_address))
        .route_layer(from_fn_with_state(state, authenticate))
}

/// GET /users/me/addresses
pub async fn list_addresses(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<Vec<Address>>, ApiError> {
    let addresses = state.account_service.list_addresses(&claims.email).await?;
    Ok(Json(addresses))
}

/// POST /users/me/addresses
pub async fn add_address(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(fields): Json<NewAddress>,
) -> Result<(StatusCode, Json<Address>), ApiError> {
    let address = state
        .account_service
        .add_address(&claims.email, fields)
        .await?;

    Ok((StatusCode::CREATED, Json(address)))
}
