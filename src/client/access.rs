//! Caller credentials
//!
//! What the access screen collects: an access code, and optionally the
//! caller's own upstream API key.

use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION};

use crate::{
    auth::{ACCESS_CODE_HEADER, ACCESS_CODE_PREFIX},
    config::ClientConfig,
};

/// Credential held by the client and sent with every proxied request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessCredential {
    pub access_code: String,
    pub upstream_api_key: Option<String>,
}

impl AccessCredential {
    pub fn with_access_code(code: impl Into<String>) -> Self {
        Self {
            access_code: code.into(),
            upstream_api_key: None,
        }
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            access_code: String::new(),
            upstream_api_key: Some(key.into()),
        }
    }

    fn code(&self) -> Option<&str> {
        Some(self.access_code.trim()).filter(|c| !c.is_empty())
    }

    fn api_key(&self) -> Option<&str> {
        self.upstream_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Write the credential headers the proxy's access gate reads
    ///
    /// A personal key goes in `Authorization`; the access code then travels
    /// in `access-code`. Without a key the code is sent as `Bearer nk-<code>`.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        match (self.api_key(), self.code()) {
            (Some(key), code) => {
                headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
                if let Some(code) = code {
                    headers.insert(ACCESS_CODE_HEADER, HeaderValue::from_str(code)?);
                }
            }
            (None, Some(code)) => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}{}", ACCESS_CODE_PREFIX, code))?,
                );
            }
            (None, None) => {}
        }
        Ok(())
    }
}

/// Client-side credential store behind the access screen
#[derive(Debug, Clone, Default)]
pub struct AccessStore {
    credential: AccessCredential,
}

impl AccessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credential(&self) -> &AccessCredential {
        &self.credential
    }

    pub fn update<F>(&mut self, f: F)
    where
        F: FnOnce(&mut AccessCredential),
    {
        f(&mut self.credential);
    }

    /// Forget both the access code and the personal key
    pub fn reset(&mut self) {
        self.credential = AccessCredential::default();
    }

    /// Whether the client can expect the proxy to accept its requests
    pub fn is_authorized(&self, server: &ClientConfig) -> bool {
        self.credential.api_key().is_some() || self.credential.code().is_some() || !server.need_code
    }

    /// Whether the access screen offers the personal API key field
    pub fn shows_api_key_field(&self, server: &ClientConfig) -> bool {
        !server.hide_user_api_key
    }
}
