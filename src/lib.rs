//! Storefront API
//!
//! Account registration, JWT access/refresh sessions, per-user address books
//! and an admin-managed product catalogue with image uploads.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{Account, Product, RefreshSession};
use infrastructure::{
    account::{AccountService, Argon2Hasher, StorageAccountRepository},
    auth::{AuthService, JwtService, SessionRegistry},
    images::LocalImageStore,
    product::ProductService,
    storage::InMemoryStorage,
};
use tracing::{info, warn};

/// Create the application state with default configuration
pub fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default())
}

/// Wire the stores and services described by `config`
pub fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    if config.auth.uses_default_secrets() {
        warn!("Token secrets are the shipped placeholders; set APP__AUTH__ACCESS_SECRET and APP__AUTH__REFRESH_SECRET");
    }

    let tokens = JwtService::new(config.auth.jwt_config())
        .map_err(|e| anyhow::anyhow!("Invalid auth configuration: {}", e))?;

    let account_storage = Arc::new(InMemoryStorage::<Account>::new());
    let session_storage = Arc::new(InMemoryStorage::<RefreshSession>::new());
    let product_storage = Arc::new(InMemoryStorage::<Product>::new());

    let account_service = Arc::new(
        AccountService::new(
            Arc::new(StorageAccountRepository::new(account_storage)),
            Arc::new(Argon2Hasher::new()),
        )
        .with_min_password_length(config.auth.min_password_length),
    );

    let sessions = Arc::new(SessionRegistry::new(session_storage));
    let auth_service = Arc::new(
        AuthService::new(account_service.clone(), Arc::new(tokens), sessions)
            .with_rotation(config.auth.rotate_refresh_tokens),
    );

    let product_service = Arc::new(ProductService::new(product_storage));
    let image_store = Arc::new(LocalImageStore::new(
        &config.uploads.dir,
        config.uploads.max_bytes,
    ));

    info!(
        upload_dir = %config.uploads.dir,
        rotate_refresh_tokens = config.auth.rotate_refresh_tokens,
        "Application state initialized"
    );

    Ok(AppState {
        auth_service,
        account_service,
        product_service,
        image_store,
        upload_limit_bytes: config.uploads.max_bytes,
    })
}
