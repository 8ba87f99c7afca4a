use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Watchlist routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/watchlist",
            get(handlers::list_entries)
                .post(handlers::add_entry)
                .delete(handlers::clear_entries),
        )
        .route("/watchlist/stats", get(handlers::get_statistics))
        .route(
            "/watchlist/:id",
            get(handlers::check_entry)
                .put(handlers::update_status)
                .delete(handlers::remove_entry),
        )
}
