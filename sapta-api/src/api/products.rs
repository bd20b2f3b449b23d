//! Catalog endpoints
//!
//! Reads are public. Mutations sit behind the admin layers in [`super::create_router`].

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use serde_json::Value;
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{CategoryCount, Identity, Product};

use super::{ApiResult, parse_id};
use crate::api::extract::ApiJson;
use crate::db::meta::{self, MetaPayload};
use crate::db::products::{ProductDraft, ProductFilter, RELATED_LIMIT};
use crate::state::AppState;

/// GET /api/products query string
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub featured: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<String>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<String>,
    pub search: Option<String>,
}

/// Blank text counts as absent; anything else is kept as sent
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn price_bound(name: &str, raw: Option<String>) -> AppResult<Option<Decimal>> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };
    Decimal::from_str(raw.trim())
        .map(Some)
        .map_err(|_| AppError::invalid_field(name, format!("{name} must be a number")))
}

impl ListQuery {
    pub fn into_filter(self) -> AppResult<ProductFilter> {
        Ok(ProductFilter {
            category: non_empty(self.category),
            featured: self.featured.as_deref() == Some("true"),
            min_price: price_bound("minPrice", self.min_price)?,
            max_price: price_bound("maxPrice", self.max_price)?,
            search: non_empty(self.search),
        })
    }
}

/// Create/update body.
///
/// `price` and `is_featured` arrive as whatever the admin form sent (number,
/// string, bool) and are coerced; `meta` may be an object or JSON text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub price: Option<Value>,
    pub is_featured: Option<Value>,
    pub dimensions: Option<String>,
    pub sizes_available: Option<String>,
    pub additional_info: Option<String>,
    pub sku: Option<String>,
    pub meta: Option<MetaPayload>,
}

/// Non-negative, two decimal places; anything unusable is 0
pub fn coerce_price(value: Option<&Value>) -> Decimal {
    let parsed = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        _ => None,
    };
    parsed
        .filter(|p| !p.is_sign_negative())
        .map(|p| p.round_dp(2))
        .unwrap_or(Decimal::ZERO)
}

pub fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        _ => false,
    }
}

fn required(field: &str, value: Option<String>) -> AppResult<String> {
    non_empty(value).ok_or_else(|| {
        AppError::with_message(ErrorCode::RequiredField, "Name and category are required")
            .with_detail("field", field)
    })
}

impl ProductInput {
    /// Strict write path: meta is validated, invalid variants dropped, and the
    /// primary image derived when none is given.
    pub fn validate(self) -> AppResult<ProductDraft> {
        let name = required("name", self.name)?;
        let category = required("category", self.category)?;
        let meta = meta::validate(self.meta)?;

        let image_url = non_empty(self.image_url).or_else(|| meta.as_ref().and_then(meta::primary_image));

        Ok(ProductDraft {
            name,
            category,
            image_url,
            description: non_empty(self.description),
            price: coerce_price(self.price.as_ref()),
            is_featured: coerce_bool(self.is_featured.as_ref()),
            dimensions: non_empty(self.dimensions),
            sizes_available: non_empty(self.sizes_available),
            additional_info: non_empty(self.additional_info),
            sku: non_empty(self.sku),
            meta: meta.map(|m| Value::Object(m).to_string()),
        })
    }

    /// Bulk-import write path: meta text is stored unvalidated and structured
    /// meta that cannot be serialized is dropped.
    pub fn into_legacy_draft(self) -> AppResult<ProductDraft> {
        let name = required("name", self.name)?;
        let category = required("category", self.category)?;

        let mut payload = self.meta;
        if let Some(MetaPayload::Structured(Value::Object(map))) = payload.as_mut() {
            meta::retain_valid_variants(map);
        }
        let derived = match &payload {
            Some(MetaPayload::Structured(Value::Object(map))) => meta::primary_image(map),
            _ => None,
        };

        Ok(ProductDraft {
            name,
            category,
            image_url: non_empty(self.image_url).or(derived),
            description: non_empty(self.description),
            price: coerce_price(self.price.as_ref()),
            is_featured: coerce_bool(self.is_featured.as_ref()),
            dimensions: non_empty(self.dimensions),
            sizes_available: non_empty(self.sizes_available),
            additional_info: non_empty(self.additional_info),
            sku: non_empty(self.sku),
            meta: meta::encode(payload.as_ref()),
        })
    }
}

fn product_not_found() -> AppError {
    AppError::new(ErrorCode::ProductNotFound)
}

/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Product>> {
    let filter = query.into_filter()?;
    let products = state.products.list(&filter).await?;
    Ok(Json(products))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Product> {
    let id = parse_id(&id)?;
    let product = state.products.get(id).await?.ok_or_else(product_not_found)?;
    Ok(Json(product))
}

/// GET /api/products/{id}/related
pub async fn related_products(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Product>> {
    let id = parse_id(&id)?;
    let products = state.products.related(id, RELATED_LIMIT).await?;
    Ok(Json(products))
}

/// GET /api/categories
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<CategoryCount>> {
    Ok(Json(state.products.categories().await?))
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let draft = input.validate()?;
    let product = state.products.create(&draft).await?;
    tracing::info!(product_id = product.id, user_id = identity.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Product> {
    let id = parse_id(&id)?;
    let draft = input.validate()?;
    let product = state
        .products
        .update(id, &draft)
        .await?
        .ok_or_else(product_not_found)?;
    tracing::info!(product_id = id, user_id = identity.id, "Product updated");
    Ok(Json(product))
}

/// DELETE /api/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<ApiResponse, AppError> {
    let id = parse_id(&id)?;
    if !state.products.delete(id).await? {
        return Err(product_not_found());
    }
    tracing::info!(product_id = id, user_id = identity.id, "Product deleted");
    Ok(ApiResponse::message("Deleted"))
}
