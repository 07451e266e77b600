//! Request logging for proxied calls
//!
//! Gives every proxied request a short correlation id and timing so its log
//! lines can be followed from arrival to completion.

use std::time::Instant;
use tracing::{info, warn, Span};
use uuid::Uuid;

/// Context for tracking a request through the proxy
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request (for log correlation)
    pub trace_id: String,
    /// When the request started
    pub start_time: Instant,
    /// HTTP method of the inbound request
    pub method: String,
    /// Requested sub-path
    pub subpath: String,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(method: &str, subpath: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string()[..8].to_string(), // Short ID for readability
            start_time: Instant::now(),
            method: method.to_string(),
            subpath: subpath.to_string(),
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    /// Elapsed time in seconds, for metrics
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Log a request that ended with an error payload
    pub fn log_failed(&self, kind: &str, reason: &str) {
        warn!(
            trace_id = %self.trace_id,
            method = %self.method,
            subpath = %self.subpath,
            kind = %kind,
            reason = %reason,
            elapsed_ms = %self.elapsed_ms(),
            "Request failed"
        );
    }

    /// Log response received from upstream
    pub fn log_upstream_response(&self, provider: &str, status: u16) {
        info!(
            trace_id = %self.trace_id,
            provider = %provider,
            subpath = %self.subpath,
            status = %status,
            elapsed_ms = %self.elapsed_ms(),
            "Response received from upstream"
        );
    }

    /// Log an upstream call that produced no response
    pub fn log_upstream_failure(&self, provider: &str, error: &str) {
        tracing::error!(
            trace_id = %self.trace_id,
            provider = %provider,
            subpath = %self.subpath,
            error = %error,
            elapsed_ms = %self.elapsed_ms(),
            "Upstream request failed"
        );
    }

    /// Create a tracing span for this request
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "proxy_request",
            trace_id = %self.trace_id,
            method = %self.method,
            subpath = %self.subpath,
        )
    }
}
