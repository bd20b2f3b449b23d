//! API routes for sapta-api

pub mod auth;
pub mod enquiry;
pub mod extract;
pub mod products;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post, put};
use axum::{Json, Router, middleware};
use shared::error::{AppError, AppResult, ErrorCode};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::rate_limit::{enquiry_rate_limit, login_rate_limit, reset_rate_limit};
use crate::auth::{require_admin, require_session};
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Multipart bodies: six files of 5 MiB plus form overhead
const UPLOAD_BODY_LIMIT: usize = 32 * 1024 * 1024;

/// Numeric path id; anything else is a client error
pub(crate) fn parse_id(raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::invalid_request("Invalid product id"))
}

async fn route_not_found() -> AppError {
    AppError::new(ErrorCode::NotFound)
}

/// CORS for the storefront origin, credentials allowed
pub fn cors_layer(frontend_origin: &str) -> Result<CorsLayer, header::InvalidHeaderValue> {
    Ok(CorsLayer::new()
        .allow_origin(HeaderValue::from_str(frontend_origin)?)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Public catalog
    let catalog = Router::new()
        .route("/api/products", get(products::list_products))
        .route("/api/products/{id}", get(products::get_product))
        .route("/api/products/{id}/related", get(products::related_products))
        .route("/api/categories", get(products::list_categories));

    let login = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    let reset = Router::new()
        .route("/api/auth/request-reset", post(auth::request_reset))
        .route("/api/auth/reset", post(auth::reset_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), reset_rate_limit));

    let session = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    // Admin mutations (layers run bottom-up: session, then role)
    let admin = Router::new()
        .route("/api/products", post(products::create_product))
        .route(
            "/api/products/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route(
            "/api/uploads",
            post(upload::upload_images).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let contact = Router::new()
        .route("/api/enquiry", post(enquiry::send_enquiry))
        .route_layer(middleware::from_fn_with_state(state.clone(), enquiry_rate_limit));

    let uploads = ServeDir::new(&state.uploads.dir);

    Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .merge(catalog)
        .merge(login)
        .merge(reset)
        .merge(session)
        .merge(admin)
        .merge(contact)
        .nest_service("/uploads", uploads)
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
