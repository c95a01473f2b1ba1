//! Authentication API endpoints
//!
//! Registration, credential login and the refresh token lifecycle. None of
//! these routes require an access token.

use axum::{extract::State, http::StatusCode, routing::post, Router};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::infrastructure::auth::TokenPair;

/// Create the authentication router
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

/// Email and password, as sent by the register and login forms
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Refresh token carried in the body of refresh and logout requests
#[derive(Debug, Default)]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

impl RefreshTokenRequest {
    /// Read `refreshToken` from whatever body was sent
    ///
    /// A missing, non-JSON or non-string value means no token.
    pub fn from_body(body: &[u8]) -> Self {
        let refresh_token = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|value| value.get("refreshToken")?.as_str().map(str::to_string));

        Self { refresh_token }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state
        .auth_service
        .register(request.email.trim(), &request.password)
        .await?;

    Ok((StatusCode::CREATED, MessageResponse::new("Registered")))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let pair = state
        .auth_service
        .login(request.email.trim(), &request.password)
        .await?;

    Ok(Json(pair.into()))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TokenResponse>, ApiError> {
    let request = RefreshTokenRequest::from_body(&body);
    let pair = state
        .auth_service
        .refresh(request.refresh_token.as_deref())
        .await?;

    Ok(Json(pair.into()))
}

/// POST /auth/logout
///
/// Always succeeds, whether or not the token was live.
pub async fn logout(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    let request = RefreshTokenRequest::from_body(&body);
    state
        .auth_service
        .logout(request.refresh_token.as_deref())
        .await?;

    Ok(MessageResponse::new("Logged out"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_token_read_from_json_body() {
        let request = RefreshTokenRequest::from_body(br#"{"refreshToken":"abc.def.ghi"}"#);
        assert_eq!(request.refresh_token.as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_unreadable_bodies_carry_no_token() {
        for body in [&b""[..], b"not json", b"[]", br#"{"refreshToken":42}"#, b"{}"] {
            assert!(RefreshTokenRequest::from_body(body).refresh_token.is_none());
        }
    }
}
