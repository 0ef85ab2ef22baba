//! Naviwatch server: `cargo run -p naviwatch-server`
//!
//! Set `NAVIWATCH_STORE=memory` to run without PostgreSQL.

use naviwatch_api::{
    app, ensure_database_exists, ensure_tables, resolve, AppState, EntityStore, MemoryStore, PgStore, Settings,
    StoreKind, CATALOGUE,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("naviwatch_api=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let registry = resolve(CATALOGUE)?;

    let store: Arc<dyn EntityStore> = match settings.store {
        StoreKind::Postgres => {
            ensure_database_exists(&settings.database_url).await?;
            let mut options = sqlx::postgres::PgPoolOptions::new().max_connections(settings.max_connections);
            if let Some(lifetime) = settings.pool_max_lifetime {
                options = options.max_lifetime(lifetime);
            }
            let pool = options.connect(&settings.database_url).await?;
            ensure_tables(&pool, &settings.schema, &registry).await?;
            Arc::new(PgStore::new(pool, settings.schema.clone()))
        }
        StoreKind::Memory => {
            tracing::warn!("using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store, registry);
    let router = app(state, settings.body_limit_bytes);
    let listener = TcpListener::bind(settings.bind_addr()).await?;
    tracing::info!("Naviwatch API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
