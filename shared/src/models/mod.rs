//! Data models
//!
//! Shared between the API server, the operator CLI and the frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (MySQL `INT AUTO_INCREMENT`).

pub mod category;
pub mod product;
pub mod user;

// Re-exports
pub use category::*;
pub use product::*;
pub use user::*;
