//! sapta-api — Storefront catalog service
//!
//! Serves the public catalog, admin product management, image uploads,
//! password login/reset and contact-form enquiries.

use std::net::SocketAddr;

use sapta_api::BoxError;
use sapta_api::api;
use sapta_api::config::Config;
use sapta_api::db;
use sapta_api::state::AppState;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sapta_api=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting sapta-api (env: {})", config.environment);

    let pool = db::connect(config.database.clone(), config.db_max_connections).await?;

    if config.auto_migrate {
        let added = db::schema::ensure_schema(&pool).await?;
        tracing::info!(added = added.len(), "Schema check complete");
    } else {
        tracing::info!("AUTO_MIGRATE disabled, skipping schema check");
    }

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let state = AppState::new(&config, pool.clone());
    let cors = api::cors_layer(&config.frontend_origin)?;
    let app = api::create_router(state.clone()).layer(cors);

    // Periodic rate limiter cleanup (every 5 minutes)
    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
        }
    });

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("sapta-api HTTP listening on {http_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pool.close().await;
    tracing::info!("sapta-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
