//! chatgate - access-gated proxy for a ChatGPT-style web client
//!
//! The server exposes `/api/openai/*path`, which relays a fixed set of
//! OpenAI API operations after checking the caller's access code or
//! personal API key. The `client` module holds the caller side: credential
//! storage and a typed HTTP client for the proxy.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod proxy;
pub mod routes;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

pub use crate::config::{ClientConfig, Config};
pub use crate::error::{AppError, AppResult};
pub use crate::proxy::{AllowList, OpenAiUpstream, Upstream};

/// Application state shared across all request handlers
pub struct AppState {
    /// Read-only after startup
    pub config: Arc<Config>,
    /// Permitted upstream sub-paths
    pub allow_list: Arc<AllowList>,
    /// Forwarder for allowed, authorized requests
    pub upstream: Arc<dyn Upstream>,
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        let upstream: Arc<dyn Upstream> = Arc::new(OpenAiUpstream::new(&config)?);
        Ok(Self::with_upstream(config, upstream))
    }

    /// Create an application state around a specific forwarder
    pub fn with_upstream(config: Config, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            config: Arc::new(config),
            allow_list: Arc::new(AllowList::new()),
            upstream,
            start_time: Instant::now(),
        }
    }
}
