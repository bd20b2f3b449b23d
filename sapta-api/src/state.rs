//! Application state

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::MySqlPool;

use crate::auth::rate_limit::RateLimiter;
use crate::auth::{CookieSettings, SessionSigner};
use crate::config::Config;
use crate::db::products::{MySqlProductStore, ProductStore};
use crate::db::users::{MySqlUserStore, UserStore};
use crate::email::{Address, BrevoMailer, Mailer};

/// Where uploads land and how their URLs are formed
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub dir: PathBuf,
    /// `{base}/uploads/{file}` when set, `/uploads/{file}` otherwise
    pub public_base_url: Option<String>,
}

impl UploadSettings {
    pub fn public_url(&self, file_name: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{base}/uploads/{file_name}"),
            None => format!("/uploads/{file_name}"),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductStore>,
    pub users: Arc<dyn UserStore>,
    pub mailer: Arc<dyn Mailer>,
    pub sessions: SessionSigner,
    pub cookies: CookieSettings,
    pub uploads: UploadSettings,
    /// Enquiry recipient
    pub enquiry_to: Address,
    /// Base of the reset link; token is only logged when unset
    pub reset_url_base: Option<String>,
    /// Allows logging reset tokens when no reset URL is configured
    pub is_development: bool,
    /// Rate limiter for login/reset/enquiry routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Build state around an already-connected pool
    pub fn new(config: &Config, pool: MySqlPool) -> Self {
        let mailer = BrevoMailer::new(
            config.mail_api_url.clone(),
            config.mail_api_key.clone(),
            Address::new(config.mail_from_email.clone(), config.mail_from_name.clone()),
        );

        Self {
            products: Arc::new(MySqlProductStore::new(pool.clone())),
            users: Arc::new(MySqlUserStore::new(pool)),
            mailer: Arc::new(mailer),
            sessions: SessionSigner::new(&config.jwt_secret),
            cookies: CookieSettings {
                domain: config.cookie_domain.clone(),
                secure: config.cookie_secure,
            },
            uploads: UploadSettings {
                dir: PathBuf::from(&config.upload_dir),
                public_base_url: config.public_base_url.clone(),
            },
            enquiry_to: Address::new(
                config.enquiry_to_email.clone(),
                config.enquiry_to_name.clone(),
            ),
            reset_url_base: config.reset_url_base.clone(),
            is_development: config.is_development(),
            rate_limiter: RateLimiter::new(config.trust_proxy),
        }
    }
}
