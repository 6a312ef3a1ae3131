use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the addon router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/manifest.json", get(handlers::manifest))
        // Catalog
        .route("/catalog/:type/:id", get(handlers::catalog))
        .route("/catalog/:type/:id/:extra", get(handlers::catalog_with_extra))
        // Meta
        .route("/meta/:type/:id", get(handlers::meta))
        // Streams
        .route("/stream/:type/:id", get(handlers::streams))
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}

/// Addon clients load from arbitrary origins
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any)
}
