//! Naviwatch API: REST CRUD over pet-care records, driven by a static entity registry.

pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use error::{AppError, ConfigError, FieldErrors};
pub use routes::{common_routes, entity_routes};
pub use schema::{resolve, Registry, ResolvedEntity, CATALOGUE};
pub use service::CrudService;
pub use settings::{Settings, StoreKind};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_tables, EntityStore, MemoryStore, PgStore};

use axum::Router;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Full application router: common and entity routes with CORS, tracing and a body limit.
pub fn app(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(entity_routes(state))
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

