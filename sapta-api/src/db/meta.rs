//! Product `meta` codec
//!
//! Three shapes meet here:
//! - [`MetaPayload`]: what a caller sent (pre-serialized text or a JSON value)
//! - bound text: what goes into the `meta JSON NULL` column
//! - [`StoredMeta`]: what came back out of the column
//!
//! [`validate`] is the strict path used by the HTTP handlers; [`encode`] is the
//! best-effort path used by bulk import, where malformed meta is dropped rather
//! than rejected.

use serde::Deserialize;
use serde_json::{Map, Value};
use shared::error::{AppError, ErrorCode};
use shared::models::{ColorVariant, META_COLOR_VARIANTS, META_IMAGES};

/// Caller-supplied meta. Absent is `Option::None` around this.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MetaPayload {
    /// Already-serialized JSON text
    Raw(String),
    /// Structured JSON value
    Structured(Value),
}

/// Column value as read back from storage
#[derive(Debug, Clone, PartialEq)]
pub enum StoredMeta {
    /// Text (MySQL `CAST(meta AS CHAR)`, or a TEXT column)
    Text(String),
    /// Native JSON value
    Json(Value),
}

/// Best-effort encode: absent or null gives NULL, text passes through
/// unchanged, anything else is serialized.
pub fn encode(meta: Option<&MetaPayload>) -> Option<String> {
    match meta? {
        MetaPayload::Raw(text) => Some(text.clone()),
        MetaPayload::Structured(Value::Null) => None,
        MetaPayload::Structured(value) => serde_json::to_string(value).ok(),
    }
}

/// Decode a stored value. Empty text and JSON `null` decode to `None`.
///
/// Text that does not parse is logged and treated as absent, so one bad row
/// cannot fail a whole listing.
pub fn decode(stored: Option<StoredMeta>) -> Option<Value> {
    let value = match stored? {
        StoredMeta::Json(value) => value,
        StoredMeta::Text(text) => {
            if text.trim().is_empty() {
                return None;
            }
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored product meta is not valid JSON");
                    return None;
                }
            }
        }
    };
    (!value.is_null()).then_some(value)
}

fn invalid_meta(message: &str) -> AppError {
    AppError::with_message(ErrorCode::ProductInvalidMeta, message).with_detail("field", "meta")
}

/// Strict path: meta must be absent, null, a JSON object, or text holding one.
///
/// Returns the normalized object with invalid color variants removed.
pub fn validate(meta: Option<MetaPayload>) -> Result<Option<Map<String, Value>>, AppError> {
    let value = match meta {
        None => return Ok(None),
        Some(MetaPayload::Raw(text)) if text.trim().is_empty() => return Ok(None),
        Some(MetaPayload::Raw(text)) => serde_json::from_str::<Value>(&text)
            .map_err(|_| invalid_meta("Meta must be valid JSON"))?,
        Some(MetaPayload::Structured(value)) => value,
    };
    match value {
        Value::Null => Ok(None),
        Value::Object(mut map) => {
            retain_valid_variants(&mut map);
            Ok(Some(map))
        }
        _ => Err(invalid_meta("Meta must be a JSON object")),
    }
}

/// Drop color variants without a name or without images.
///
/// Only touches `colorVariants` when it is an array; entries are kept as sent.
pub fn retain_valid_variants(map: &mut Map<String, Value>) {
    if let Some(Value::Array(variants)) = map.get_mut(META_COLOR_VARIANTS) {
        variants.retain(|v| {
            serde_json::from_value::<ColorVariant>(v.clone()).is_ok_and(|cv| cv.is_valid())
        });
    }
}

/// Effective primary image when the caller gave none: first gallery image,
/// then first image of the first valid color variant.
pub fn primary_image(meta: &Map<String, Value>) -> Option<String> {
    let first_string =
        |v: &Value| v.as_array()?.iter().find_map(Value::as_str).map(str::to_owned);

    if let Some(url) = meta.get(META_IMAGES).and_then(first_string) {
        return Some(url);
    }
    meta.get(META_COLOR_VARIANTS)?
        .as_array()?
        .iter()
        .filter_map(|v| serde_json::from_value::<ColorVariant>(v.clone()).ok())
        .find(ColorVariant::is_valid)
        .and_then(|cv| cv.images.into_iter().next())
}
