//! Idempotent schema step
//!
//! Creates missing tables, then adds extended columns that older databases
//! lack. Safe to run on every startup.

use sqlx::MySqlPool;

const CREATE_PRODUCTS: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id INT AUTO_INCREMENT PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    category VARCHAR(120) NOT NULL,
    image_url VARCHAR(512) NULL,
    description TEXT NULL,
    price DECIMAL(10,2) NOT NULL DEFAULT 0,
    is_featured TINYINT(1) NOT NULL DEFAULT 0,
    dimensions VARCHAR(255) NULL,
    sizes_available VARCHAR(255) NULL,
    additional_info TEXT NULL,
    sku VARCHAR(120) NULL,
    meta JSON NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INT AUTO_INCREMENT PRIMARY KEY,
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    role VARCHAR(50) NOT NULL DEFAULT 'admin',
    reset_token VARCHAR(128) NULL,
    reset_expires DATETIME NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Columns added after the first release: (table, column, definition)
pub const EXTENDED_COLUMNS: &[(&str, &str, &str)] = &[
    ("products", "meta", "JSON NULL"),
    ("products", "dimensions", "VARCHAR(255) NULL"),
    ("products", "sizes_available", "VARCHAR(255) NULL"),
    ("products", "additional_info", "TEXT NULL"),
    ("products", "sku", "VARCHAR(120) NULL"),
    ("users", "reset_token", "VARCHAR(128) NULL"),
    ("users", "reset_expires", "DATETIME NULL"),
];

pub fn add_column_sql(table: &str, column: &str, definition: &str) -> String {
    format!("ALTER TABLE {table} ADD COLUMN {column} {definition}")
}

async fn column_exists(pool: &MySqlPool, table: &str, column: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM information_schema.COLUMNS
        WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND COLUMN_NAME = ?
        "#,
    )
    .bind(table)
    .bind(column)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Bring the schema up to date. Returns `table.column` for every column added.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query(CREATE_PRODUCTS).execute(pool).await?;
    sqlx::query(CREATE_USERS).execute(pool).await?;

    let mut added = Vec::new();
    for (table, column, definition) in EXTENDED_COLUMNS {
        if column_exists(pool, table, column).await? {
            continue;
        }
        sqlx::query(&add_column_sql(table, column, definition))
            .execute(pool)
            .await?;
        tracing::info!(table = %table, column = %column, "Added missing column");
        added.push(format!("{table}.{column}"));
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_column_sql() {
        assert_eq!(
            add_column_sql("products", "meta", "JSON NULL"),
            "ALTER TABLE products ADD COLUMN meta JSON NULL"
        );
    }

    #[test]
    fn test_create_statements_carry_every_extended_column() {
        for (table, column, definition) in EXTENDED_COLUMNS {
            let create = match *table {
                "products" => CREATE_PRODUCTS,
                "users" => CREATE_USERS,
                other => panic!("unexpected table {other}"),
            };
            assert!(
                create.contains(&format!("{column} {definition}")),
                "{table}.{column} missing from CREATE TABLE"
            );
        }
    }

    #[test]
    fn test_create_statements_are_idempotent() {
        assert!(CREATE_PRODUCTS.contains("CREATE TABLE IF NOT EXISTS products"));
        assert!(CREATE_USERS.contains("CREATE TABLE IF NOT EXISTS users"));
        assert!(CREATE_PRODUCTS.contains("price DECIMAL(10,2) NOT NULL DEFAULT 0"));
    }
}
