//! Shared types for the Sapta storefront
//!
//! Wire models, the unified error system and small utilities used by the
//! API server and the operator CLI.

pub mod error;
pub mod models;
pub mod util;
