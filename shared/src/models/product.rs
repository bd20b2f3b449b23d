//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Key of the general gallery inside `meta`
pub const META_IMAGES: &str = "images";
/// Key of the color variant list inside `meta`
pub const META_COLOR_VARIANTS: &str = "colorVariants";

/// Product entity as returned by the catalog API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Free-text category, used for filtering and grouping
    pub category: String,
    /// Primary display image (absolute URL or `/uploads/...`)
    pub image_url: Option<String>,
    pub description: Option<String>,
    /// Non-negative price, serialized as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub is_featured: bool,
    pub dimensions: Option<String>,
    pub sizes_available: Option<String>,
    pub additional_info: Option<String>,
    pub sku: Option<String>,
    /// Structured metadata: `images`, `colorVariants` and any caller-supplied keys.
    /// `None` serializes as `null`, never `{}`.
    pub meta: Option<serde_json::Value>,
}

/// A named sub-gallery representing a purchasable color/pattern option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorVariant {
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ColorVariant {
    /// A variant is kept only when it has a name and at least one image
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.images.is_empty()
    }
}
