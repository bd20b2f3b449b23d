//! Signed session tokens carried in an HTTP-only cookie

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use chrono::{DateTime, Duration, Utc};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use shared::models::Identity;
use thiserror::Error;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "auth_token";

const SESSION_TTL_DAYS: i64 = 7;

/// JWT claims for a storefront session
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: String,
    pub email: String,
    pub role: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: i64,
    /// Issued at (Unix timestamp seconds)
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to sign session token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("invalid session token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("malformed session subject")]
    Subject,
}

/// Issues and verifies session tokens (HS256)
#[derive(Clone)]
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, identity: &Identity) -> Result<String, SessionError> {
        self.issue_at(identity, Utc::now())
    }

    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String, SessionError> {
        let claims = SessionClaims {
            sub: identity.id.to_string(),
            email: identity.email.clone(),
            role: identity.role.clone(),
            exp: (now + Duration::days(SESSION_TTL_DAYS)).timestamp(),
            iat: now.timestamp(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding).map_err(SessionError::Sign)
    }

    /// Signature and expiry check
    pub fn verify(&self, token: &str) -> Result<Identity, SessionError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &Validation::default())
            .map_err(SessionError::Invalid)?;
        let claims = data.claims;
        Ok(Identity {
            id: claims.sub.parse().map_err(|_| SessionError::Subject)?,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Pure role check, independent of token verification
pub fn require_role(identity: &Identity, role: &str) -> AppResult<()> {
    if identity.role == role {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}

/// Session cookie attributes
#[derive(Debug, Clone, Default)]
pub struct CookieSettings {
    pub domain: Option<String>,
    /// `Secure` + `SameSite=None` (cross-site storefront) when true
    pub secure: bool,
}

impl CookieSettings {
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        let mut builder = Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(if self.secure {
                SameSite::None
            } else {
                SameSite::Lax
            })
            .max_age(cookie::time::Duration::days(SESSION_TTL_DAYS));
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        builder.build()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.session_cookie(String::new());
        cookie.make_removal();
        cookie
    }
}

/// Session token from the `Cookie` request header(s)
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use shared::models::ADMIN_ROLE;

    fn admin() -> Identity {
        Identity {
            id: 1,
            email: "admin@example.com".into(),
            role: ADMIN_ROLE.into(),
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let signer = SessionSigner::new("test-secret");
        let token = signer.issue(&admin()).unwrap();
        assert_eq!(signer.verify(&token).unwrap(), admin());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = SessionSigner::new("secret-a").issue(&admin()).unwrap();
        assert!(SessionSigner::new("secret-b").verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = SessionSigner::new("test-secret");
        let token = signer
            .issue_at(&admin(), Utc::now() - Duration::days(8))
            .unwrap();
        assert!(matches!(signer.verify(&token), Err(SessionError::Invalid(_))));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let signer = SessionSigner::new("test-secret");
        assert!(signer.verify("not-a-token").is_err());
        assert!(signer.verify("").is_err());
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(&admin(), ADMIN_ROLE).is_ok());
        let viewer = Identity {
            role: "viewer".into(),
            ..admin()
        };
        let err = require_role(&viewer, ADMIN_ROLE).unwrap_err();
        assert_eq!(err.http_status(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let secure = CookieSettings {
            domain: Some("sapta.example".into()),
            secure: true,
        };
        let header = secure.session_cookie("tok".into()).to_string();
        assert!(header.starts_with("auth_token=tok"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=None"));
        assert!(header.contains("Domain=sapta.example"));
        assert!(header.contains("Max-Age=604800"));

        let lax = CookieSettings::default().session_cookie("tok".into()).to_string();
        assert!(lax.contains("SameSite=Lax"));
        assert!(!lax.contains("Secure"));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let header = CookieSettings::default().removal_cookie().to_string();
        assert!(header.starts_with("auth_token=;"));
        assert!(header.contains("Max-Age=0"));
    }

    #[test]
    fn test_session_token_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; auth_token=abc.def"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def"));
    }
}
