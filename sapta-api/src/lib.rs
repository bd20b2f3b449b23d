//! sapta-api — Storefront catalog service
//!
//! REST service behind the Sapta Home storefront:
//! - Public catalog reads (products, related products, categories)
//! - Admin product mutations and image uploads (cookie session, admin role)
//! - Password login and the reset-token flow
//! - Contact-form enquiries forwarded to the transactional email API

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod state;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
