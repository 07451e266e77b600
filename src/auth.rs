//! Access gate
//!
//! Decides whether a caller may use the proxy and which credential the
//! forwarder should present upstream. Callers send either an access code or
//! their own upstream API key:
//!
//! - `Authorization: Bearer nk-<code>` carries an access code
//! - `Authorization: Bearer <key>` carries an upstream API key
//! - `access-code: <code>` carries an access code alongside a bearer key

use axum::http::{header, HeaderMap};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{config::Config, error::AppError};

/// Bearer tokens with this prefix are access codes, not API keys
pub const ACCESS_CODE_PREFIX: &str = "nk-";

/// Dedicated header for access codes
pub const ACCESS_CODE_HEADER: &str = "access-code";

/// Credentials a caller presented on a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentedCredentials {
    pub access_code: Option<String>,
    pub api_key: Option<String>,
}

/// Credential the forwarder must send upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamCredential {
    /// Caller's own upstream key
    Caller(String),
    /// Key held by the server
    Server(String),
    /// Nothing to send; the upstream decides
    Anonymous,
}

impl UpstreamCredential {
    pub fn bearer(&self) -> Option<&str> {
        match self {
            UpstreamCredential::Caller(key) | UpstreamCredential::Server(key) => Some(key),
            UpstreamCredential::Anonymous => None,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            UpstreamCredential::Caller(_) => "caller",
            UpstreamCredential::Server(_) => "server",
            UpstreamCredential::Anonymous => "none",
        }
    }
}

/// Extract the Authorization header and return the bearer token
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim)
}

/// Hash an access code for comparison against the configured digests
pub fn hash_access_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

/// Read the access code and API key from request headers
pub fn parse_credentials(headers: &HeaderMap) -> PresentedCredentials {
    let mut credentials = PresentedCredentials::default();

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        match token.strip_prefix(ACCESS_CODE_PREFIX) {
            Some(code) => {
                credentials.access_code = Some(code)
                    .filter(|code| !code.is_empty())
                    .map(str::to_string)
            }
            None => credentials.api_key = Some(token.to_string()),
        }
    }

    if let Some(code) = headers
        .get(ACCESS_CODE_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|code| !code.is_empty())
    {
        credentials.access_code = Some(code.to_string());
    }

    credentials
}

/// Authorize a request against the server configuration
///
/// Returns the credential to present upstream, or `Unauthorized` when the
/// caller is not permitted.
pub fn authorize(headers: &HeaderMap, config: &Config) -> Result<UpstreamCredential, AppError> {
    let presented = parse_credentials(headers);

    let code_valid = presented
        .access_code
        .as_deref()
        .map(|code| config.access_codes.contains(&hash_access_code(code)))
        .unwrap_or(false);

    if config.need_code() && !code_valid && presented.api_key.is_none() {
        let msg = if presented.access_code.is_none() {
            "empty access code"
        } else {
            "wrong access code"
        };
        warn!(reason = msg, "Access code check failed");
        return Err(AppError::Unauthorized(msg.to_string()));
    }

    if config.hide_user_api_key && presented.api_key.is_some() {
        warn!("Caller presented an API key while user keys are disabled");
        return Err(AppError::Unauthorized(
            "you are not allowed to access with your own api key".to_string(),
        ));
    }

    let credential = match (presented.api_key, &config.openai_api_key) {
        (Some(key), _) => UpstreamCredential::Caller(key),
        (None, Some(key)) => UpstreamCredential::Server(key.clone()),
        (None, None) => {
            warn!("No upstream API key configured and none presented by the caller");
            UpstreamCredential::Anonymous
        }
    };

    debug!(source = credential.source(), "Request authorized");
    Ok(credential)
}
