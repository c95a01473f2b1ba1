//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::account::AccountService;
use crate::infrastructure::auth::AuthService;
use crate::infrastructure::images::ImageStore;
use crate::infrastructure::product::ProductService;

/// Services shared by every handler
#[derive(Clone, Debug)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub account_service: Arc<AccountService>,
    pub product_service: Arc<ProductService>,
    pub image_store: Arc<dyn ImageStore>,
    /// Maximum accepted size of a product write request body
    pub upload_limit_bytes: usize,
}
