use crate::error::FetchError;
use crate::types::query::FeedQuery;
use crate::types::review::{Review, ReviewPage};
use std::future::Future;

pub const TOTAL_HEADER: &str = "x-wp-total";
pub const TOTAL_PAGES_HEADER: &str = "x-wp-totalpages";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub total: Option<String>,
    pub body: Vec<u8>,
}

pub trait ReviewTransport: Send + Sync + 'static {
    fn get(&self, path_and_query: &str)
    -> impl Future<Output = Result<RawResponse, FetchError>> + Send;
}

pub async fn fetch_page<T: ReviewTransport>(
    transport: &T,
    query: &FeedQuery,
) -> Result<ReviewPage, FetchError> {
    let path = query.path();
    tracing::debug!(%path, "fetching reviews");
    let response = transport.get(&path).await?;
    decode_page(response, query.offset)
}

/// Without a usable total header the total is `offset + received`.
pub fn decode_page(response: RawResponse, offset: usize) -> Result<ReviewPage, FetchError> {
    if !(200..300).contains(&response.status) {
        return Err(FetchError::Http {
            status: response.status,
            body: response.body,
        });
    }
    let reviews: Vec<Review> =
        serde_json::from_slice(&response.body).map_err(|err| FetchError::BodyParse {
            message: err.to_string(),
        })?;
    let total = response
        .total
        .as_deref()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(offset + reviews.len());
    Ok(ReviewPage { reviews, total })
}
