pub mod error;
pub mod reviews;

use crate::middleware::correlation::correlation_middleware;
use crate::{AppState, openapi};
use axum::Router;
use axum::middleware;
use tower_http::trace::TraceLayer;

pub const STORE_API_PREFIX: &str = "/wc/store/v1";

pub fn router(state: AppState) -> Router {
    let store_api = Router::new()
        .merge(reviews::router(state))
        .route_layer(middleware::from_fn(correlation_middleware));

    Router::new()
        .nest(STORE_API_PREFIX, store_api)
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
}
