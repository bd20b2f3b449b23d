//! Session authentication for the admin surface

pub mod middleware;
pub mod rate_limit;
pub mod session;

pub use middleware::{require_admin, require_session};
pub use session::{CookieSettings, SessionSigner, require_role};
