//! Configuration management for chatgate
//!
//! Configuration is loaded once from environment variables and never mutated
//! afterwards. Handlers receive it through `AppState`.

use std::collections::{HashMap, HashSet};
use std::env;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::hash_access_code;

/// Upstream used when `BASE_URL` is not set
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Largest request body accepted on the proxy route when `MAX_BODY_BYTES` is unset
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Model family disabled by `DISABLE_GPT4`
pub const GPT4_FAMILY_PREFIX: &str = "gpt-4";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Upstream API base URL, normalized (scheme present, no trailing slash)
    pub base_url: String,
    /// Server-held upstream API key
    pub openai_api_key: Option<String>,
    /// Organization sent as `OpenAI-Organization`
    pub openai_org_id: Option<String>,

    /// SHA-256 hex digests of the accepted access codes
    pub access_codes: HashSet<String>,
    /// Reject caller-supplied API keys and hide the field in the client
    pub hide_user_api_key: bool,
    /// Model identifiers starting with this prefix are hidden and refused
    pub disabled_model_prefix: Option<String>,
    /// Hide the balance query in the client
    pub hide_balance_query: bool,

    /// Timeout for a single upstream request (in seconds)
    pub request_timeout_secs: u64,
    /// Largest request body the proxy route buffers
    pub max_body_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| {
            lookup(key)
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false)
        };
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let disabled_model_prefix = non_empty("DISABLED_MODEL_PREFIX").or_else(|| {
            flag("DISABLE_GPT4").then(|| GPT4_FAMILY_PREFIX.to_string())
        });

        Ok(Self {
            host: lookup("CHATGATE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("CHATGATE_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .context("Invalid CHATGATE_PORT")?,

            base_url: normalize_base_url(non_empty("BASE_URL").as_deref()),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_org_id: non_empty("OPENAI_ORG_ID"),

            access_codes: parse_access_codes(lookup("CODE").as_deref().unwrap_or("")),
            hide_user_api_key: flag("HIDE_USER_API_KEY"),
            disabled_model_prefix,
            hide_balance_query: flag("HIDE_BALANCE_QUERY"),

            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|| "600".to_string())
                .parse()
                .context("Invalid REQUEST_TIMEOUT_SECS")?,
            max_body_bytes: match lookup("MAX_BODY_BYTES") {
                Some(raw) => raw.trim().parse().context("Invalid MAX_BODY_BYTES")?,
                None => DEFAULT_MAX_BODY_BYTES,
            },
        })
    }

    /// Load configuration from a map, for tests and embedding
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Whether callers must present a valid access code (absent a personal key)
    pub fn need_code(&self) -> bool {
        !self.access_codes.is_empty()
    }

    /// Whether the disabled family is the `gpt-4` family the client knows about
    pub fn disable_gpt4(&self) -> bool {
        self.disabled_model_prefix.as_deref() == Some(GPT4_FAMILY_PREFIX)
    }

    /// The subset of configuration the web client is allowed to see
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            need_code: self.need_code(),
            hide_user_api_key: self.hide_user_api_key,
            disable_gpt4: self.disable_gpt4(),
            hide_balance_query: self.hide_balance_query,
        }
    }
}

/// Configuration exposed to the web client at `/api/config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(rename = "needCode")]
    pub need_code: bool,
    #[serde(rename = "hideUserApiKey")]
    pub hide_user_api_key: bool,
    #[serde(rename = "disableGPT4")]
    pub disable_gpt4: bool,
    #[serde(rename = "hideBalanceQuery")]
    pub hide_balance_query: bool,
}

/// Split the comma-separated `CODE` value and hash each entry
pub fn parse_access_codes(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(hash_access_code)
        .collect()
}

/// Give the base URL a scheme and strip the trailing slash
pub fn normalize_base_url(raw: Option<&str>) -> String {
    let raw = raw.map(str::trim).unwrap_or(DEFAULT_BASE_URL);
    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    with_scheme.trim_end_matches('/').to_string()
}
