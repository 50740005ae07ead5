use crate::middleware::correlation::CorrelationId;
use crate::routes::error::map_error;
use crate::{AppState, open_store};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use rf_core::error::StoreError;
use rf_core::reviews::ReviewRepository;
use rf_core::store::Store;
use rf_core::transport::{TOTAL_HEADER, TOTAL_PAGES_HEADER};
use rf_core::types::query::FeedQuery;
use rf_core::types::review::{Review, ReviewPage};
use utoipa::IntoParams;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/products/reviews", get(list_reviews))
        .with_state(state)
}

/// Query parameters accepted by the reviews route.
#[derive(Debug, IntoParams)]
#[into_params(parameter_in = Query)]
#[allow(dead_code)]
pub struct ReviewListParams {
    /// `asc` or `desc`.
    order: Option<String>,
    /// `date_gmt` or `rating`.
    orderby: Option<String>,
    /// Page size, 0 to 100.
    per_page: Option<usize>,
    offset: Option<usize>,
    product_id: Option<u64>,
    /// Comma separated category ids.
    category_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/wc/store/v1/products/reviews",
    params(ReviewListParams),
    responses(
        (status = 200, description = "One page of reviews", body = Vec<Review>,
            headers(
                ("X-WP-Total" = String, description = "Matching reviews"),
                ("X-WP-TotalPages" = String, description = "Pages at this page size")
            )),
        (status = 400, description = "Invalid parameter", body = crate::routes::error::ErrorEnvelope)
    )
)]
pub(crate) async fn list_reviews(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let correlation_id = Some(correlation.0);
    let query = match FeedQuery::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))) {
        Ok(query) => query,
        Err(err) => return map_error(&StoreError::Query(err), correlation_id),
    };
    let store = match open_store(&state) {
        Ok(store) => store,
        Err(err) => return map_error(&err, correlation_id),
    };
    match store.reviews().list(&query) {
        Ok(page) => {
            tracing::debug!(
                total = page.total,
                returned = page.reviews.len(),
                offset = query.offset,
                "listed reviews"
            );
            let headers = page_headers(&page, query.per_page);
            (headers, Json(page.reviews)).into_response()
        }
        Err(err) => map_error(&err, correlation_id),
    }
}

fn page_headers(page: &ReviewPage, per_page: usize) -> HeaderMap {
    let total_pages = if per_page == 0 {
        0
    } else {
        page.total.div_ceil(per_page)
    };
    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_HEADER, HeaderValue::from(page.total));
    headers.insert(TOTAL_PAGES_HEADER, HeaderValue::from(total_pages));
    headers
}
