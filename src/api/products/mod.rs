//! Product catalogue endpoints
//!
//! Reads are public. Writes go through the authentication and admin gates
//! and accept either JSON or the admin panel's multipart form.

mod payload;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::api::middleware::{authenticate, require_admin};
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::product::{Product, ProductStatus};

pub use payload::{ImageUpload, ProductInput, ProductPayload};

/// Room for multipart framing and text fields on top of the image itself
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the product router
pub fn create_product_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_products))
        .route("/{id}", get(get_product));

    let admin = Router::new()
        .route("/", post(create_product))
        .route("/{id}", put(update_product).delete(delete_product))
        .route_layer(from_fn_with_state(state.clone(), require_admin))
        .route_layer(from_fn_with_state(state.clone(), authenticate))
        .layer(DefaultBodyLimit::max(
            state.upload_limit_bytes + FORM_OVERHEAD_BYTES,
        ));

    public.merge(admin)
}

/// Product as returned to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: Option<String>,
    pub category: String,
    pub stock: u32,
    pub unit: String,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id().as_str().to_string(),
            name: product.name().to_string(),
            description: product.description().to_string(),
            price: product.price(),
            image: product.image().map(str::to_string),
            category: product.category().to_string(),
            stock: product.stock(),
            unit: product.unit().to_string(),
            status: product.status(),
            created_at: product.created_at(),
            updated_at: product.updated_at(),
        }
    }
}

/// GET /products
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.product_service.list().await?;
    Ok(Json(products.iter().map(ProductResponse::from).collect()))
}

/// GET /products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.product_service.get(&id).await?;
    Ok(Json(ProductResponse::from(&product)))
}

/// POST /products
pub async fn create_product(
    State(state): State<AppState>,
    payload: ProductPayload,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let ProductPayload { mut changes, image } = payload;

    let stored_image = match image {
        Some(upload) => {
            let path = state.image_store.save(&upload.file_name, upload.data).await?;
            changes.image = Some(path.clone());
            Some(path)
        }
        None => None,
    };

    match state.product_service.create(changes).await {
        Ok(product) => Ok((StatusCode::CREATED, Json(ProductResponse::from(&product)))),
        Err(e) => {
            discard_image(&state, stored_image.as_deref()).await;
            Err(e.into())
        }
    }
}

/// PUT /products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: ProductPayload,
) -> Result<Json<ProductResponse>, ApiError> {
    let ProductPayload { mut changes, image } = payload;
    let previous_image = state
        .product_service
        .get(&id)
        .await?
        .image()
        .map(str::to_string);

    let stored_image = match image {
        Some(upload) => {
            let path = state.image_store.save(&upload.file_name, upload.data).await?;
            changes.image = Some(path.clone());
            Some(path)
        }
        None => None,
    };

    match state.product_service.update(&id, changes).await {
        Ok(product) => {
            if previous_image.as_deref() != product.image() {
                discard_image(&state, previous_image.as_deref()).await;
            }
            Ok(Json(ProductResponse::from(&product)))
        }
        Err(e) => {
            discard_image(&state, stored_image.as_deref()).await;
            Err(e.into())
        }
    }
}

/// DELETE /products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let product = state.product_service.delete(&id).await?;
    discard_image(&state, product.image()).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Best-effort removal of an image that is no longer referenced
async fn discard_image(state: &AppState, path: Option<&str>) {
    let Some(path) = path else {
        return;
    };

    if let Err(e) = state.image_store.delete(path).await {
        warn!(path = %path, error = %e, "Failed to remove product image");
    }
}
