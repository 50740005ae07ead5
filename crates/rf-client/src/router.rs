use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::Request;
use rf_core::error::FetchError;
use rf_core::transport::{RawResponse, ReviewTransport, TOTAL_HEADER};
use tower::ServiceExt;

#[derive(Clone)]
pub struct RouterTransport {
    router: Router,
}

impl RouterTransport {
    pub fn new(router: Router) -> Self {
        Self { router }
    }
}

impl ReviewTransport for RouterTransport {
    async fn get(&self, path_and_query: &str) -> Result<RawResponse, FetchError> {
        let request = Request::get(path_and_query)
            .body(Body::empty())
            .map_err(|err| FetchError::Network {
                message: err.to_string(),
            })?;
        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let status = response.status().as_u16();
        let total = response
            .headers()
            .get(TOTAL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|err| FetchError::Network {
                message: err.to_string(),
            })?
            .to_vec();
        Ok(RawResponse {
            status,
            total,
            body,
        })
    }
}
