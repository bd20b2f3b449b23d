//! Database layer (MySQL via sqlx)
//!
//! Stores are traits so handlers never see the pool directly.

pub mod meta;
pub mod products;
pub mod schema;
pub mod users;

use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};

/// Build the process-lifetime pool. Called once from each binary.
pub async fn connect(
    options: MySqlConnectOptions,
    max_connections: u32,
) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}
