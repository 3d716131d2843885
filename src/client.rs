//! HTTP transport for directory searches.
//!
//! [`SearchTransport`] is the seam the agent depends on; the default
//! implementation wraps reqwest and tests substitute scripted transports.

use crate::error::SearchError;
use crate::protocol::api;
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status} with unreadable body: {source}")]
    Body {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl From<TransportError> for SearchError {
    fn from(err: TransportError) -> Self {
        SearchError::Invalid(err.to_string())
    }
}

/// Fetches a search URI and returns the parsed JSON body.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    async fn fetch(&self, uri: Url) -> Result<Value, TransportError>;
}

#[derive(Clone)]
pub struct HttpSearchClient {
    client: Client,
}

impl HttpSearchClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SearchTransport for HttpSearchClient {
    /// Bodies are parsed regardless of HTTP status so the normalizer sees
    /// the directory's own `status` field. A 404 whose body is not JSON is
    /// reported as the directory's not-found payload.
    async fn fetch(&self, uri: Url) -> Result<Value, TransportError> {
        let response = self.client.get(uri).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!("Search response: HTTP {} ({} bytes)", status, body.len());

        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => Ok(value),
            Err(_) if status == StatusCode::NOT_FOUND => {
                let mut body = Map::new();
                body.insert(api::STATUS.into(), Value::from(api::STATUS_NOT_FOUND));
                Ok(Value::Object(body))
            }
            Err(source) => Err(TransportError::Body {
                status: status.as_u16(),
                source,
            }),
        }
    }
}
