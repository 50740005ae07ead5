use crate::routes::error::{ErrorData, ErrorEnvelope};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use rf_core::types::enums::{Order, OrderBy};
use rf_core::types::ids::{ProductId, ReviewId};
use rf_core::types::review::{ProductImage, Review};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "revfeed Store API", description = "Product reviews endpoint"),
    paths(crate::routes::reviews::list_reviews),
    components(schemas(
        Review,
        ProductImage,
        ReviewId,
        ProductId,
        Order,
        OrderBy,
        ErrorEnvelope,
        ErrorData
    ))
)]
struct ApiDoc;

pub fn generate_spec() -> String {
    ApiDoc::openapi()
        .to_pretty_json()
        .unwrap_or_else(|_| "{}".to_string())
}

pub fn router() -> Router {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
