//! Upstream forwarder
//!
//! Relays an authorized request to the configured OpenAI-compatible API.
//! Transport failures come back as [`UpstreamFailure`] values rather than
//! propagating as faults, so the route can turn them into a diagnostic
//! payload.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::{
    auth::UpstreamCredential,
    config::Config,
    proxy::headers::{build_upstream_headers, filter_response_headers},
};

/// An authorized request ready to be relayed
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    /// Allowed sub-path, without a leading slash
    pub subpath: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub credential: UpstreamCredential,
}

/// Response relayed from upstream
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Diagnostic for a request that never produced an upstream response
#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[error("{message}")]
pub struct UpstreamFailure {
    pub message: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl UpstreamFailure {
    pub fn new(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            url: url.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    fn from_reqwest(err: &reqwest::Error, url: &str) -> Self {
        let failure = Self::new(err.to_string(), url);
        match err.source() {
            Some(source) => failure.with_cause(source.to_string()),
            None => failure,
        }
    }

    /// Indented JSON inside a ```json fence, ready to render as markdown
    pub fn pretty(&self) -> String {
        let json = serde_json::to_string_pretty(self).unwrap_or_else(|_| self.message.clone());
        ["```json", json.as_str(), "```"].join("\n")
    }
}

/// Seam between the route and the network
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Provider name for logging and metrics
    fn name(&self) -> &'static str;

    /// Issue exactly one upstream call
    async fn forward(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamFailure>;
}

/// reqwest-backed forwarder for OpenAI-compatible APIs
pub struct OpenAiUpstream {
    client: reqwest::Client,
    base_url: String,
    org_id: Option<String>,
    timeout: Duration,
}

impl OpenAiUpstream {
    /// Create a forwarder with its own pooled client
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a forwarder around an existing client
    pub fn with_client(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            org_id: config.openai_org_id.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Full upstream URL for a sub-path and optional query string
    pub fn url_for(&self, subpath: &str, query: Option<&str>) -> String {
        match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{}/{}?{}", self.base_url, subpath, query),
            None => format!("{}/{}", self.base_url, subpath),
        }
    }

    fn convert_response(response: reqwest::Response) -> UpstreamResponse {
        UpstreamResponse {
            status: response.status(),
            headers: filter_response_headers(response.headers()),
            body: Body::from_stream(response.bytes_stream()),
        }
    }
}

#[async_trait]
impl Upstream for OpenAiUpstream {
    fn name(&self) -> &'static str {
        "openai"
    }

    #[instrument(skip_all, fields(method = %request.method, subpath = %request.subpath))]
    async fn forward(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamFailure> {
        let url = self.url_for(&request.subpath, request.query.as_deref());

        let headers =
            build_upstream_headers(&request.headers, &request.credential, self.org_id.as_deref())
                .map_err(|e| {
                    error!(url = %url, error = %e, "Credential is not a valid header value");
                    UpstreamFailure::new("invalid upstream credential", &url)
                        .with_cause(e.to_string())
                })?;

        debug!(
            url = %url,
            credential = request.credential.source(),
            body_len = request.body.len(),
            "Sending request upstream"
        );

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(headers)
            .timeout(self.timeout);

        // Only add body for methods that support it
        if request.method != Method::GET && request.method != Method::HEAD {
            builder = builder.body(request.body);
        }

        let response = builder.send().await.map_err(|e| {
            error!(url = %url, error = %e, "Failed to send request upstream");
            UpstreamFailure::from_reqwest(&e, &url)
        })?;

        debug!(url = %url, status = %response.status(), "Received upstream response");

        Ok(Self::convert_response(response))
    }
}
