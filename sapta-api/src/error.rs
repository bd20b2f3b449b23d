//! Unified service-layer error type
//!
//! `ServiceError` bridges DB-layer errors (`sqlx::Error`, `BoxError`) and the
//! API-layer error (`AppError`), so store methods can use `?` and handlers can
//! return them directly.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::BoxError;

/// MySQL SQLSTATE for ER_BAD_FIELD_ERROR (unknown column)
const SQLSTATE_UNKNOWN_COLUMN: &str = "42S22";

/// Service-layer error
///
/// - `Db`: Database/infrastructure errors (auto-logged, mapped to InternalError)
/// - `SchemaMismatch`: the live table lacks a column the query names
/// - `App`: Business-rule errors (transparent pass-through to client)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    SchemaMismatch { column: String },
    App(AppError),
}

/// Column name quoted in "Unknown column 'meta' in 'field list'"
fn unknown_column(message: &str) -> Option<String> {
    let start = message.find('\'')? + 1;
    let len = message[start..].find('\'')?;
    let column = &message[start..start + len];
    // "products.meta" when the query qualifies it
    let column = column.rsplit('.').next().unwrap_or(column);
    (!column.is_empty()).then(|| column.to_string())
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Db(e) => write!(f, "database error: {e}"),
            ServiceError::SchemaMismatch { column } => {
                write!(f, "schema is missing column `{column}`")
            }
            ServiceError::App(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.code().as_deref() == Some(SQLSTATE_UNKNOWN_COLUMN)
        {
            let column = unknown_column(db_err.message()).unwrap_or_else(|| "unknown".into());
            return ServiceError::SchemaMismatch { column };
        }
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::SchemaMismatch { column } => {
                tracing::error!(column = %column, "Query references a missing column");
                AppError::new(ErrorCode::SchemaMismatch)
                    .with_detail("column", column)
                    .with_detail("hint", "run `sapta-admin migrate`")
            }
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_column_parsing() {
        assert_eq!(
            unknown_column("Unknown column 'meta' in 'field list'").as_deref(),
            Some("meta")
        );
        assert_eq!(
            unknown_column("Unknown column 'products.sku' in 'where clause'").as_deref(),
            Some("sku")
        );
        assert_eq!(unknown_column("no quotes here"), None);
    }

    #[test]
    fn test_schema_mismatch_maps_to_distinct_code() {
        let err: AppError = ServiceError::SchemaMismatch {
            column: "meta".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::SchemaMismatch);
        let details = err.details.unwrap();
        assert_eq!(details.get("column").unwrap(), "meta");
        assert!(details.contains_key("hint"));
    }

    #[test]
    fn test_db_error_hides_text() {
        let err: AppError = ServiceError::Db("connection reset by peer".into()).into();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "Internal server error");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_non_database_sqlx_error_is_opaque() {
        let err = ServiceError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, ServiceError::Db(_)));
    }
}
