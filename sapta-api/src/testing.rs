//! In-memory stores and request helpers for router tests

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use shared::models::{ADMIN_ROLE, CategoryCount, Identity, Product};
use tokio::sync::Mutex;
use tower::ServiceExt;

use crate::auth::rate_limit::RateLimiter;
use crate::auth::{CookieSettings, SessionSigner};
use crate::db::meta::{self, StoredMeta};
use crate::db::products::{ProductDraft, ProductFilter, ProductStore};
use crate::db::users::{UserRecord, UserStore};
use crate::email::{Address, MailError, Mailer, OutboundEmail};
use crate::error::ServiceResult;
use crate::state::{AppState, UploadSettings};

// ========== Products ==========

#[derive(Default)]
struct ProductTable {
    last_id: i64,
    rows: BTreeMap<i64, ProductDraft>,
}

/// Same filter and ordering semantics as the MySQL queries
#[derive(Default)]
pub struct InMemoryProductStore {
    table: Mutex<ProductTable>,
}

fn to_product(id: i64, draft: &ProductDraft) -> Product {
    Product {
        id,
        name: draft.name.clone(),
        category: draft.category.clone(),
        image_url: draft.image_url.clone(),
        description: draft.description.clone(),
        price: draft.price,
        is_featured: draft.is_featured,
        dimensions: draft.dimensions.clone(),
        sizes_available: draft.sizes_available.clone(),
        additional_info: draft.additional_info.clone(),
        sku: draft.sku.clone(),
        meta: meta::decode(draft.meta.clone().map(StoredMeta::Text)),
    }
}

fn contains_lower(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase().contains(needle))
}

fn matches(filter: &ProductFilter, draft: &ProductDraft) -> bool {
    if filter.category.as_ref().is_some_and(|c| *c != draft.category) {
        return false;
    }
    if filter.featured && !draft.is_featured {
        return false;
    }
    if filter.min_price.is_some_and(|min| draft.price < min) {
        return false;
    }
    if filter.max_price.is_some_and(|max| draft.price > max) {
        return false;
    }
    if let Some(term) = &filter.search {
        let needle = term.to_lowercase();
        return contains_lower(Some(&draft.name), &needle)
            || contains_lower(draft.description.as_deref(), &needle)
            || contains_lower(draft.sku.as_deref(), &needle);
    }
    true
}

impl InMemoryProductStore {
    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.rows.is_empty()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn list(&self, filter: &ProductFilter) -> ServiceResult<Vec<Product>> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .iter()
            .rev()
            .filter(|(_, draft)| matches(filter, draft))
            .map(|(id, draft)| to_product(*id, draft))
            .collect())
    }

    async fn get(&self, id: i64) -> ServiceResult<Option<Product>> {
        let table = self.table.lock().await;
        Ok(table.rows.get(&id).map(|draft| to_product(id, draft)))
    }

    async fn related(&self, id: i64, limit: i64) -> ServiceResult<Vec<Product>> {
        let table = self.table.lock().await;
        let category = table.rows.get(&id).map(|d| d.category.clone());
        Ok(table
            .rows
            .iter()
            .rev()
            .filter(|(other, _)| **other != id)
            .filter(|(_, d)| category.as_ref().is_none_or(|c| *c == d.category))
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|(id, draft)| to_product(*id, draft))
            .collect())
    }

    async fn create(&self, draft: &ProductDraft) -> ServiceResult<Product> {
        let mut table = self.table.lock().await;
        table.last_id += 1;
        let id = table.last_id;
        table.rows.insert(id, draft.clone());
        Ok(to_product(id, draft))
    }

    async fn update(&self, id: i64, draft: &ProductDraft) -> ServiceResult<Option<Product>> {
        let mut table = self.table.lock().await;
        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        *row = draft.clone();
        Ok(Some(to_product(id, draft)))
    }

    async fn delete(&self, id: i64) -> ServiceResult<bool> {
        Ok(self.table.lock().await.rows.remove(&id).is_some())
    }

    async fn categories(&self) -> ServiceResult<Vec<CategoryCount>> {
        let table = self.table.lock().await;
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for draft in table.rows.values() {
            *counts.entry(draft.category.clone()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect())
    }
}

// ========== Users ==========

struct StoredUser {
    record: UserRecord,
    reset_token: Option<String>,
    reset_expires: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<StoredUser>>,
}

impl InMemoryUserStore {
    /// bcrypt at minimum cost keeps tests fast
    pub async fn add(&self, email: &str, password: &str, role: &str) {
        let mut users = self.users.lock().await;
        let id = users.len() as i64 + 1;
        users.push(StoredUser {
            record: UserRecord {
                id,
                email: email.to_string(),
                password_hash: bcrypt::hash(password, 4).unwrap(),
                role: role.to_string(),
            },
            reset_token: None,
            reset_expires: None,
        });
    }

    pub async fn pending_reset(&self, email: &str) -> bool {
        self.users
            .lock()
            .await
            .iter()
            .any(|u| u.record.email == email && u.reset_token.is_some())
    }

    /// Move every reset expiry into the past
    pub async fn expire_resets(&self) {
        for user in self.users.lock().await.iter_mut() {
            if user.reset_expires.is_some() {
                user.reset_expires = Some(Utc::now() - chrono::Duration::minutes(1));
            }
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<UserRecord>> {
        let users = self.users.lock().await;
        Ok(users
            .iter()
            .find(|u| u.record.email == email)
            .map(|u| u.record.clone()))
    }

    async fn set_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> ServiceResult<bool> {
        let mut users = self.users.lock().await;
        let Some(user) = users.iter_mut().find(|u| u.record.email == email) else {
            return Ok(false);
        };
        user.reset_token = Some(token_hash.to_string());
        user.reset_expires = Some(expires_at);
        Ok(true)
    }

    async fn consume_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<bool> {
        let mut users = self.users.lock().await;
        let Some(user) = users.iter_mut().find(|u| {
            u.reset_token.as_deref() == Some(token_hash) && u.reset_expires.is_some_and(|e| e > now)
        }) else {
            return Ok(false);
        };
        user.record.password_hash = password_hash.to_string();
        user.reset_token = None;
        user.reset_expires = None;
        Ok(true)
    }

    async fn upsert_admin(&self, email: &str, password_hash: &str) -> ServiceResult<()> {
        let mut users = self.users.lock().await;
        if let Some(user) = users.iter_mut().find(|u| u.record.email == email) {
            user.record.password_hash = password_hash.to_string();
            user.record.role = ADMIN_ROLE.to_string();
            return Ok(());
        }
        let id = users.len() as i64 + 1;
        users.push(StoredUser {
            record: UserRecord {
                id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                role: ADMIN_ROLE.to_string(),
            },
            reset_token: None,
            reset_expires: None,
        });
        Ok(())
    }
}

// ========== Mail ==========

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().await.clone()
    }

    /// Token from the most recent reset link
    pub async fn last_reset_token(&self) -> Option<String> {
        let sent = self.sent.lock().await;
        sent.iter().rev().find_map(|mail| {
            let start = mail.html.find("token=")? + "token=".len();
            let rest = &mail.html[start..];
            let end = rest.find(['"', '<', '&']).unwrap_or(rest.len());
            Some(rest[..end].to_string())
        })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Rejected {
                status: 503,
                body: "service unavailable".into(),
            });
        }
        self.sent.lock().await.push(email);
        Ok(())
    }
}

// ========== Context ==========

pub struct TestContext {
    pub state: AppState,
    pub products: Arc<InMemoryProductStore>,
    pub users: Arc<InMemoryUserStore>,
    pub mailer: Arc<RecordingMailer>,
    upload_dir: tempfile::TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let products = Arc::new(InMemoryProductStore::default());
        let users = Arc::new(InMemoryUserStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        let upload_dir = tempfile::tempdir().unwrap();

        let state = AppState {
            products: products.clone(),
            users: users.clone(),
            mailer: mailer.clone(),
            sessions: SessionSigner::new("test-secret"),
            cookies: CookieSettings::default(),
            uploads: UploadSettings {
                dir: PathBuf::from(upload_dir.path()),
                public_base_url: None,
            },
            enquiry_to: Address::new("support@sapta.test", "Support Team"),
            reset_url_base: Some("https://sapta.test/reset-password".into()),
            is_development: true,
            rate_limiter: RateLimiter::new(false),
        };

        Self {
            state,
            products,
            users,
            mailer,
            upload_dir,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        self.upload_dir.path()
    }

    /// `Cookie` header value carrying a session for `role`
    pub fn cookie_for(&self, role: &str) -> String {
        let identity = Identity {
            id: 1,
            email: format!("{role}@sapta.test"),
            role: role.to_string(),
        };
        let token = self.state.sessions.issue(&identity).unwrap();
        format!("auth_token={token}")
    }

    pub fn admin_cookie(&self) -> String {
        self.cookie_for(ADMIN_ROLE)
    }

    pub async fn seed(&self, name: &str, category: &str, price: i64) -> i64 {
        let draft = ProductDraft {
            name: name.to_string(),
            category: category.to_string(),
            image_url: None,
            description: None,
            price: Decimal::from(price),
            is_featured: false,
            dimensions: None,
            sizes_available: None,
            additional_info: None,
            sku: None,
            meta: None,
        };
        self.products.create(&draft).await.unwrap().id
    }
}

// ========== Requests ==========

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
    /// `Null` when the body is not JSON
    pub json: Value,
}

pub fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse {
        status,
        headers,
        bytes,
        json,
    }
}
