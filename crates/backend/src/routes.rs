use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers;
use crate::domain::listing::service::CatalogService;

/// Route table of the application
pub fn configure_routes(service: CatalogService) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // Listing catalog
        .route(
            "/api/listings",
            get(handlers::listing::search).post(handlers::listing::create),
        )
        .route(
            "/api/listings/:id",
            get(handlers::listing::get_by_id)
                .patch(handlers::listing::update)
                .delete(handlers::listing::delete),
        )
        .route(
            "/api/listings/:id/sold",
            post(handlers::listing::mark_sold),
        )
        .with_state(service)
}
