//! sapta-admin — operator tasks against the storefront database
//!
//! - `migrate`: create tables and add any missing columns
//! - `create-admin`: create an admin account or reset its password
//! - `import`: bulk-load products from a JSON file

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;

use sapta_api::api::products::ProductInput;
use sapta_api::config::{self, Config};
use sapta_api::db::products::{MySqlProductStore, ProductStore};
use sapta_api::db::users::{MySqlUserStore, UserStore};
use sapta_api::db::{self, schema};
use sapta_api::util::hash_password;

#[derive(Parser)]
#[command(name = "sapta-admin")]
#[command(about = "Sapta storefront operations CLI")]
struct Cli {
    /// Overrides DATABASE_URL / DB_*
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create tables and add missing columns
    Migrate,
    /// Create an admin, or replace the password of an existing email
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Import products from `{"products": [...]}`
    Import { file: PathBuf },
}

#[derive(Deserialize)]
struct ImportFile {
    products: Vec<ProductInput>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sapta_api=info,sapta_admin=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let options = match cli.database_url.as_deref() {
        Some(url) => config::parse_database_url(url),
        None => Config::database_options(),
    }
    .map_err(|e| anyhow::anyhow!("{e}"))?;
    let pool = db::connect(options, 5)
        .await
        .context("failed to connect to database")?;

    let result = match cli.command {
        Command::Migrate => migrate(&pool).await,
        Command::CreateAdmin { email, password } => create_admin(&pool, &email, &password).await,
        Command::Import { file } => import(&pool, &file).await,
    };

    pool.close().await;
    result
}

async fn migrate(pool: &sqlx::MySqlPool) -> anyhow::Result<()> {
    let added = schema::ensure_schema(pool)
        .await
        .context("schema migration failed")?;
    if added.is_empty() {
        println!("Schema up to date");
    } else {
        println!("Added columns: {}", added.join(", "));
    }
    Ok(())
}

async fn create_admin(pool: &sqlx::MySqlPool, email: &str, password: &str) -> anyhow::Result<()> {
    let email = email.trim();
    anyhow::ensure!(!email.is_empty(), "--email must not be empty");
    anyhow::ensure!(!password.is_empty(), "--password must not be empty");

    let hash = hash_password(password).map_err(|e| anyhow::anyhow!("hashing failed: {e}"))?;
    MySqlUserStore::new(pool.clone())
        .upsert_admin(email, &hash)
        .await?;
    println!("Admin user ensured for {email}");
    Ok(())
}

async fn import(pool: &sqlx::MySqlPool, file: &Path) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let payload: ImportFile = serde_json::from_str(&text).context("invalid import file")?;

    let store = MySqlProductStore::new(pool.clone());
    let total = payload.products.len();
    let mut imported = 0usize;
    for (index, input) in payload.products.into_iter().enumerate() {
        let draft = match input.into_legacy_draft() {
            Ok(draft) => draft,
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping product");
                continue;
            }
        };
        match store.create(&draft).await {
            Ok(product) => {
                imported += 1;
                tracing::debug!(id = product.id, name = %product.name, "Imported product");
            }
            Err(e) => tracing::warn!(index, name = %draft.name, error = %e, "Insert failed"),
        }
    }

    println!("Imported {imported} of {total} products");
    Ok(())
}
