//! Product write payloads: JSON or multipart form

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    extract::{
        multipart::{Multipart, MultipartError},
        FromRequest, Request,
    },
    http::header,
};
use bytes::Bytes;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::error::FieldViolation;
use crate::domain::product::{ProductChanges, ProductStatus};

/// JSON body for product writes; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub stock: Option<u32>,
    pub unit: Option<String>,
    pub status: Option<ProductStatus>,
    pub image: Option<String>,
}

impl From<ProductInput> for ProductChanges {
    fn from(input: ProductInput) -> Self {
        Self {
            name: input.name,
            description: input.description,
            price: input.price,
            category: input.category,
            stock: input.stock,
            unit: input.unit,
            status: input.status,
            image: input.image,
        }
    }
}

/// An uploaded image file part
#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub data: Bytes,
}

/// Parsed product write request
#[derive(Debug)]
pub struct ProductPayload {
    pub changes: ProductChanges,
    pub image: Option<ImageUpload>,
}

impl FromRequest<AppState> for ProductPayload {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::new(rejection.status(), rejection.body_text()))?;
            return read_form(multipart).await;
        }

        let Json(input) = Json::<ProductInput>::from_request(req, state).await?;
        Ok(Self {
            changes: input.into(),
            image: None,
        })
    }
}

async fn read_form(mut multipart: Multipart) -> Result<ProductPayload, ApiError> {
    let mut fields = HashMap::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let data = field.bytes().await.map_err(multipart_error)?;

            // Browsers send an empty, unnamed part when no file was chosen
            if name == "image" && !(file_name.is_empty() && data.is_empty()) {
                image = Some(ImageUpload { file_name, data });
            }
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        fields.insert(name, value);
    }

    Ok(ProductPayload {
        changes: parse_form_fields(fields)?,
        image,
    })
}

/// Convert text form fields; blank numeric fields count as absent
fn parse_form_fields(mut fields: HashMap<String, String>) -> Result<ProductChanges, ApiError> {
    let mut violations = Vec::new();

    let price_raw = take_trimmed(&mut fields, "price");
    let stock_raw = take_trimmed(&mut fields, "stock");
    let status_raw = take_trimmed(&mut fields, "status");
    let image = take_trimmed(&mut fields, "image");

    let price = price_raw.and_then(|raw| match Decimal::from_str(&raw) {
        Ok(price) => Some(price),
        Err(_) => {
            violations.push(FieldViolation::new("price", "Price must be a number"));
            None
        }
    });

    let stock = stock_raw.and_then(|raw| match raw.parse::<u32>() {
        Ok(stock) => Some(stock),
        Err(_) => {
            violations.push(FieldViolation::new(
                "stock",
                "Stock must be a non-negative whole number",
            ));
            None
        }
    });

    let status = status_raw.and_then(|raw| match ProductStatus::from_str(&raw) {
        Ok(status) => Some(status),
        Err(message) => {
            violations.push(FieldViolation::new("status", message));
            None
        }
    });

    if !violations.is_empty() {
        return Err(ApiError::bad_request("Validation failed").with_errors(violations));
    }

    Ok(ProductChanges {
        name: fields.remove("name"),
        description: fields.remove("description"),
        price,
        category: fields.remove("category"),
        stock,
        unit: fields.remove("unit"),
        status,
        image,
    })
}

fn take_trimmed(fields: &mut HashMap<String, String>, key: &str) -> Option<String> {
    let value = fields.remove(key)?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::new(err.status(), err.body_text())
}
