//! User identity as carried in the session token

use serde::{Deserialize, Serialize};

/// Role granted full catalog mutation rights
pub const ADMIN_ROLE: &str = "admin";

/// Authenticated principal: `{id, email, role}`
///
/// Returned by login and `/api/auth/me`; the password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub role: String,
}
