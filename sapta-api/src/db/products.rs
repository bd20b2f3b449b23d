//! Product database operations

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{CategoryCount, Product};
use sqlx::{MySql, MySqlPool, QueryBuilder};

use super::meta::{self, StoredMeta};
use crate::error::{ServiceError, ServiceResult};

/// Related products returned per request
pub const RELATED_LIMIT: i64 = 6;

/// Projection shared by every product read. `meta` is cast to text so the
/// codec sees the same shape regardless of server JSON handling.
const PRODUCT_COLUMNS: &str = "id, name, category, image_url, description, price, is_featured, \
     dimensions, sizes_available, additional_info, sku, CAST(meta AS CHAR) AS meta";

/// Conjunctive list filters. `None`/`false` means no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub featured: bool,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
}

/// Validated write: every mutable column, defaults already applied
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_featured: bool,
    pub dimensions: Option<String>,
    pub sizes_available: Option<String>,
    pub additional_info: Option<String>,
    pub sku: Option<String>,
    /// Encoded JSON text for the `meta` column
    pub meta: Option<String>,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Newest first
    async fn list(&self, filter: &ProductFilter) -> ServiceResult<Vec<Product>>;
    async fn get(&self, id: i64) -> ServiceResult<Option<Product>>;
    /// Same category as `id`, excluding it, newest first. An unknown `id`
    /// places no category constraint.
    async fn related(&self, id: i64, limit: i64) -> ServiceResult<Vec<Product>>;
    async fn create(&self, draft: &ProductDraft) -> ServiceResult<Product>;
    /// Full replace. `None` when the row does not exist.
    async fn update(&self, id: i64, draft: &ProductDraft) -> ServiceResult<Option<Product>>;
    /// `false` when nothing was deleted
    async fn delete(&self, id: i64) -> ServiceResult<bool>;
    /// Alphabetical by category
    async fn categories(&self) -> ServiceResult<Vec<CategoryCount>>;
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    category: String,
    image_url: Option<String>,
    description: Option<String>,
    price: Decimal,
    is_featured: bool,
    dimensions: Option<String>,
    sizes_available: Option<String>,
    additional_info: Option<String>,
    sku: Option<String>,
    meta: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            category: row.category,
            image_url: row.image_url,
            description: row.description,
            price: row.price,
            is_featured: row.is_featured,
            dimensions: row.dimensions,
            sizes_available: row.sizes_available,
            additional_info: row.additional_info,
            sku: row.sku,
            meta: meta::decode(row.meta.map(StoredMeta::Text)),
        }
    }
}

/// Escape LIKE wildcards so the term matches literally
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn like_pattern(term: &str) -> String {
    format!("%{}%", escape_like(&term.to_lowercase()))
}

pub fn list_query(filter: &ProductFilter) -> QueryBuilder<'static, MySql> {
    let mut qb = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1 = 1"));

    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
    if filter.featured {
        qb.push(" AND is_featured = 1");
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
    if let Some(term) = &filter.search {
        let pattern = like_pattern(term);
        qb.push(" AND (LOWER(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(description) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(sku) LIKE ")
            .push_bind(pattern)
            .push(")");
    }

    qb.push(" ORDER BY id DESC");
    qb
}

pub fn related_query(id: i64, category: Option<String>, limit: i64) -> QueryBuilder<'static, MySql> {
    let mut qb = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id <> "));
    qb.push_bind(id);
    if let Some(category) = category {
        qb.push(" AND category = ").push_bind(category);
    }
    qb.push(" ORDER BY id DESC LIMIT ").push_bind(limit);
    qb
}

/// MySQL-backed product store
#[derive(Clone)]
pub struct MySqlProductStore {
    pool: MySqlPool,
}

impl MySqlProductStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for MySqlProductStore {
    async fn list(&self, filter: &ProductFilter) -> ServiceResult<Vec<Product>> {
        let rows: Vec<ProductRow> = list_query(filter)
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get(&self, id: i64) -> ServiceResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn related(&self, id: i64, limit: i64) -> ServiceResult<Vec<Product>> {
        let category: Option<String> =
            sqlx::query_scalar("SELECT category FROM products WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let rows: Vec<ProductRow> = related_query(id, category, limit)
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn create(&self, draft: &ProductDraft) -> ServiceResult<Product> {
        let result = sqlx::query(
            r#"
            INSERT INTO products (
                name, category, image_url, description, price, is_featured,
                dimensions, sizes_available, additional_info, sku, meta
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.category)
        .bind(&draft.image_url)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.is_featured)
        .bind(&draft.dimensions)
        .bind(&draft.sizes_available)
        .bind(&draft.additional_info)
        .bind(&draft.sku)
        .bind(&draft.meta)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id() as i64;
        self.get(id)
            .await?
            .ok_or_else(|| ServiceError::Db(format!("Inserted product {id} not readable").into()))
    }

    async fn update(&self, id: i64, draft: &ProductDraft) -> ServiceResult<Option<Product>> {
        // rows_affected is 0 for an unchanged row on MySQL, so existence is
        // decided by the re-read below
        sqlx::query(
            r#"
            UPDATE products SET
                name = ?, category = ?, image_url = ?, description = ?, price = ?,
                is_featured = ?, dimensions = ?, sizes_available = ?,
                additional_info = ?, sku = ?, meta = ?
            WHERE id = ?
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.category)
        .bind(&draft.image_url)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.is_featured)
        .bind(&draft.dimensions)
        .bind(&draft.sizes_available)
        .bind(&draft.additional_info)
        .bind(&draft.sku)
        .bind(&draft.meta)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }

    async fn delete(&self, id: i64) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn categories(&self) -> ServiceResult<Vec<CategoryCount>> {
        let rows = sqlx::query_as::<_, CategoryCount>(
            "SELECT category, COUNT(*) AS count FROM products GROUP BY category ORDER BY category ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
