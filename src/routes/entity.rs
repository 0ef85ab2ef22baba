//! Entity CRUD routes built from the resolved registry.
//! Each entity gets its own static routes; handlers find the entity through the [`EntityPath`] extension.

use crate::handlers::entity::{create, delete as delete_handler, list, read, update, EntityPath};
use crate::state::AppState;
use axum::{routing::get, Extension, Router};
use std::sync::Arc;

pub fn entity_routes(state: AppState) -> Router {
    let mut router = Router::new();
    for entity in &state.registry.entities {
        let segment = &entity.path_segment;
        let routes = Router::new()
            .route(&format!("/{}/", segment), get(list).post(create))
            .route(&format!("/{}", segment), get(list).post(create))
            .route(
                &format!("/{}/:id", segment),
                get(read).put(update).delete(delete_handler),
            )
            .layer(Extension(EntityPath(Arc::from(segment.as_str()))));
        router = router.merge(routes);
    }
    router.with_state(state)
}
