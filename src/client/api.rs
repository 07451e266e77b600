//! Typed HTTP client for the proxy
//!
//! Used by a front end (or a script) to talk to a running chatgate server.

use reqwest::header::{HeaderMap, InvalidHeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::{
    client::AccessCredential,
    config::ClientConfig,
    error::ErrorResponse,
    proxy::{ModelList, OpenAiPath},
};

/// Errors seen by proxy callers
#[derive(Debug, Error)]
pub enum ClientError {
    /// The proxy answered with an `{error: true, msg}` payload
    #[error("request rejected ({status}): {msg}")]
    Rejected { status: u16, msg: String },

    /// Non-success status without a proxy error payload
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid credential: {0}")]
    InvalidCredential(#[from] InvalidHeaderValue),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Client for a chatgate server
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    /// Create a new client for the server at `base_url`
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch what the access screen needs to know
    #[instrument(skip(self))]
    pub async fn fetch_config(&self) -> ClientResult<ClientConfig> {
        let url = format!("{}/api/config", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::decode(response).await
    }

    /// List the models the proxy exposes
    #[instrument(skip(self, credential))]
    pub async fn list_models(&self, credential: &AccessCredential) -> ClientResult<ModelList> {
        let response = self
            .client
            .get(self.openai_url(OpenAiPath::ListModels))
            .headers(Self::credential_headers(credential)?)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Non-streaming chat completion
    #[instrument(skip(self, credential, body))]
    pub async fn chat_completions(
        &self,
        credential: &AccessCredential,
        body: &Value,
    ) -> ClientResult<Value> {
        let response = self
            .client
            .post(self.openai_url(OpenAiPath::Chat))
            .headers(Self::credential_headers(credential)?)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    fn openai_url(&self, path: OpenAiPath) -> String {
        format!("{}/api/openai/{}", self.base_url, path)
    }

    fn credential_headers(credential: &AccessCredential) -> ClientResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        credential.apply(&mut headers)?;
        Ok(headers)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, body_len = body.len(), "Proxy response received");

        if !status.is_success() {
            warn!(status = %status, "Proxy request failed");
            return Err(match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) if err.error => ClientError::Rejected {
                    status: status.as_u16(),
                    msg: err.msg,
                },
                _ => ClientError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
