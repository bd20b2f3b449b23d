//! JSON body extractor that reports failures in the API error shape

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use shared::error::AppError;

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// `Json<T>` whose rejections render as `{code, message, details}`
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(body_error(rejection)),
        }
    }
}

fn body_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => {
            let text = e.body_text();
            let reason = text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(&text);
            match field_path(reason) {
                Some((field, cause)) => {
                    AppError::invalid_field(field, format!("Invalid value for `{field}`: {cause}"))
                }
                None => AppError::validation(format!("Invalid request body: {reason}")),
            }
        }
        JsonRejection::JsonSyntaxError(_) => AppError::invalid_request("Malformed JSON body"),
        JsonRejection::MissingJsonContentType(_) => {
            AppError::invalid_request("Expected `Content-Type: application/json`")
        }
        other => {
            tracing::debug!(error = %other, "Request body rejected");
            AppError::invalid_request("Could not read request body")
        }
    }
}

/// Splits `sizes[2]: invalid type ...` into the path and the cause
fn field_path(reason: &str) -> Option<(&str, &str)> {
    let (path, cause) = reason.split_once(": ")?;
    let is_path = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    is_path.then_some((path, cause))
}
