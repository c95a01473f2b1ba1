//! Bearer token gates
//!
//! `authenticate` verifies the access token and stores its claims in the
//! request extensions; `require_admin` must be layered after it. Handlers
//! read the claims through the `CurrentUser` extractor.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::account::Role;
use crate::infrastructure::auth::AccessClaims;

/// Authentication gate: 401 without a bearer token, 403 for a bad one
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;
    let claims = state.auth_service.authenticate(token)?;

    debug!(account_id = %claims.sub, role = %claims.role, "Request authenticated");
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Authorization gate requiring the admin role
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = request
        .extensions()
        .get::<AccessClaims>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    state.auth_service.authorize(claims, Role::Admin)?;

    Ok(next.run(request).await)
}

/// Claims of the authenticated caller, placed by `authenticate`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AccessClaims);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessClaims>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))
}
