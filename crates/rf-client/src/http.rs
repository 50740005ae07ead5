use rf_core::error::FetchError;
use rf_core::transport::{RawResponse, ReviewTransport, TOTAL_HEADER};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{path_and_query}", self.base_url)
    }
}

impl ReviewTransport for HttpTransport {
    async fn get(&self, path_and_query: &str) -> Result<RawResponse, FetchError> {
        let url = self.url(path_and_query);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| network(&url, &err))?;

        let status = response.status().as_u16();
        let total = response
            .headers()
            .get(TOTAL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|err| network(&url, &err))?
            .to_vec();

        tracing::debug!(%url, status, ?total, "review request finished");
        Ok(RawResponse {
            status,
            total,
            body,
        })
    }
}

fn network(url: &str, err: &reqwest::Error) -> FetchError {
    tracing::warn!(%url, error = %err, "review request failed");
    FetchError::Network {
        message: err.to_string(),
    }
}
