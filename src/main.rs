use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cinepick::{
    api::{create_router, AppState},
    config::{Config, StorageBackend},
    db,
    services::watchlist::{AccountWatchlists, KeyValueAccounts, MemoryStore, PostgresAccounts, RedisStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cinepick=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let watchlists: Arc<dyn AccountWatchlists> = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config.database_url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            Arc::new(PostgresAccounts::new(pool))
        }
        StorageBackend::Redis => {
            let redis_url = config
                .redis_url
                .as_deref()
                .context("REDIS_URL must be set when STORAGE_BACKEND=redis")?;
            let client = db::create_redis_client(redis_url)?;
            Arc::new(KeyValueAccounts::new(Arc::new(RedisStore::new(client))))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, watchlists are lost on restart");
            Arc::new(KeyValueAccounts::new(Arc::new(MemoryStore::new())))
        }
    };

    let app = create_router(AppState::new(watchlists));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(addr = %addr, backend = ?config.storage_backend, "Watchlist service listening");

    axum::serve(listener, app).await?;
    Ok(())
}
