//! Fetching the reflector payload.

use std::future::Future;

use reqwest::{header::ACCEPT, Client, StatusCode, Url};

use crate::reflector::HeadersPayload;

/// Transport fault while fetching the payload.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source of reflector payloads.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<HeadersPayload, FetchError>> + Send;
}

/// Fetches over HTTP from a reflector endpoint.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    endpoint: Url,
}

impl HttpFetcher {
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn get(&self) -> Result<HeadersPayload, FetchError> {
        let res = self
            .client
            .get(self.endpoint.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: status_description(status, text),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self) -> impl Future<Output = Result<HeadersPayload, FetchError>> + Send {
        self.get()
    }
}

/// Response body, or the canonical reason phrase when the body is empty.
fn status_description(status: StatusCode, body: String) -> String {
    if body.trim().is_empty() {
        status.canonical_reason().unwrap_or_default().to_string()
    } else {
        body
    }
}
