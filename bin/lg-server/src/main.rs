//! Leadgate Server
//!
//! Production server for the lead-intake platform:
//! - Public APIs: application submission, email check, analytics tracking
//! - Admin APIs: application review, webhook logs, site config
//! - Webhook delivery and analytics flushing run as background tasks
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LG_API_PORT` | `8080` | HTTP API port |
//! | `LG_DATABASE_PATH` | `leadgate.db` | SQLite database file |
//! | `LG_ADMIN_API_KEY` | - | Admin API key (required) |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use lg_platform::api::{platform_router, ApiKeyConfig, PlatformApiDoc};
use lg_platform::repository::{
    AnalyticsStore, ApplicationStore, ConfigStore, DeliveryLogStore, SqliteAnalyticsStore,
    SqliteApplicationStore, SqliteConfigStore, SqliteDeliveryLogStore,
};
use lg_platform::service::{
    AnalyticsBuffer, AnalyticsBufferConfig, IntakeService, TracingNotifier, WebhookDispatcher,
    WebhookDispatcherConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port: u16 = std::env::var("LG_API_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .context("Invalid LG_API_PORT")?;
    let database_path =
        std::env::var("LG_DATABASE_PATH").unwrap_or_else(|_| "leadgate.db".to_string());
    let api_key = std::env::var("LG_ADMIN_API_KEY").context("LG_ADMIN_API_KEY must be set")?;

    let pool = connect_database(&database_path).await?;
    info!(path = %database_path, "Connected to SQLite");

    // Repositories
    let application_store = SqliteApplicationStore::new(pool.clone());
    let config_store = SqliteConfigStore::new(pool.clone());
    let delivery_log_store = SqliteDeliveryLogStore::new(pool.clone());
    let analytics_store = SqliteAnalyticsStore::new(pool.clone());

    application_store.init_schema().await?;
    config_store.init_schema().await?;
    delivery_log_store.init_schema().await?;
    analytics_store.init_schema().await?;

    let application_store: Arc<dyn ApplicationStore> = Arc::new(application_store);
    let config_store: Arc<dyn ConfigStore> = Arc::new(config_store);
    let delivery_log_store: Arc<dyn DeliveryLogStore> = Arc::new(delivery_log_store);
    let analytics_store: Arc<dyn AnalyticsStore> = Arc::new(analytics_store);

    // Services
    let dispatcher = WebhookDispatcher::new(
        config_store.clone(),
        delivery_log_store.clone(),
        WebhookDispatcherConfig::default(),
    )?;

    let analytics_buffer =
        AnalyticsBuffer::new(analytics_store.clone(), AnalyticsBufferConfig::default());
    analytics_buffer.start();

    let intake = Arc::new(IntakeService::new(
        application_store,
        dispatcher.clone(),
        Arc::new(TracingNotifier),
    ));

    let app = platform_router(
        intake,
        analytics_buffer.clone(),
        analytics_store,
        dispatcher,
        delivery_log_store,
        config_store,
        ApiKeyConfig::new(api_key),
    )
    .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", PlatformApiDoc::openapi()))
    .layer(TraceLayer::new_for_http())
    .layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "Leadgate server listening");

    let buffer_for_shutdown = analytics_buffer.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received, flushing analytics buffer");
            buffer_for_shutdown.shutdown().await;
        })
        .await?;

    Ok(())
}

async fn connect_database(path: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("Failed to open SQLite database")?;
    Ok(pool)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
