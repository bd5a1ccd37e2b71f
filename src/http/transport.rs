//! Wire transport: the only place that talks to the network.

use async_trait::async_trait;

use super::request::{ApiRequest, ApiResponse};
use crate::config::ClientConfig;
use crate::error::PagedashError;

/// Sends a request and buffers the response.
///
/// Non-2xx statuses are returned as `Ok`; only failures to get a response at
/// all are errors. Status interpretation belongs to the pipeline.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, PagedashError>;
}

/// [`Transport`] backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ReqwestTransport {
    pub fn new(config: ClientConfig) -> Result<Self, PagedashError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self { client, config })
    }

    /// Use an existing client (shared pools, custom TLS, ...).
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, PagedashError> {
        let url = self.config.url_for(request.path());
        let mut builder = self
            .client
            .request(request.method().clone(), &url)
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;
        tracing::debug!(method = %request.method(), path = request.path(), status, "api response");
        Ok(ApiResponse::new(status, body).with_headers(headers))
    }
}
