//! HTTP surface: catalog reads, cache flush and health.

mod error;
mod handlers;
mod middleware;
mod params;
mod state;

pub use error::{ApiError, codes};
pub use middleware::RequestContext;
pub use params::{ListingMode, ListingQuery, MAX_PAGE_SIZE};
pub use state::HttpState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use self::middleware::{log_responses, set_request_context};

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/catalog/{kind}", get(handlers::list_entities))
        .route("/catalog/{kind}/search", get(handlers::search_entities))
        .route("/catalog/{kind}/{id}", get(handlers::entity_detail))
        .route("/catalog/{kind}/{id}/film", get(handlers::person_films))
        .route("/services/flush-cache", post(handlers::flush_cache))
        .route("/healthz", get(handlers::health))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
