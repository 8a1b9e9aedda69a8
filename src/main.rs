//! Marketplace - catalog and cart service

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketplace::{
    build_router,
    config::AppConfig,
    services::EventPublisher,
    store::{CatalogStore, MemoryCatalogStore, MemorySessionStore, PgCatalogStore, PgSessionStore, SessionStore},
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let (catalog, sessions): (Arc<dyn CatalogStore>, Arc<dyn SessionStore>) = match &config.database {
        Some(db) => {
            let pool = PgPoolOptions::new().max_connections(db.max_connections).connect(&db.url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!(max_connections = db.max_connections, "database connection established");
            let catalog: Arc<dyn CatalogStore> = Arc::new(PgCatalogStore::new(pool.clone()));
            let sessions: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(pool));
            (catalog, sessions)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory stores; data is lost on restart");
            let store = MemoryCatalogStore::new();
            let merchant = store.add_merchant("demo", None).await;
            tracing::info!(merchant_id = merchant.id, "seeded demo merchant");
            let catalog: Arc<dyn CatalogStore> = Arc::new(store);
            let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
            (catalog, sessions)
        }
    };

    let events = match &config.nats_url {
        Some(url) => EventPublisher::connect(url).await,
        None => EventPublisher::disabled(),
    };

    let state = AppState::new(catalog, sessions, events, &config.session_cookie);
    let app = build_router(state)?;

    let addr = config.server_address();
    tracing::info!("marketplace listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
