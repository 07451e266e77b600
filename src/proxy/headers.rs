//! Header handling for upstream requests and relayed responses
//!
//! Client headers are not forwarded as-is. The outbound set is built from
//! scratch so the caller's access code never leaves the proxy.

use axum::http::header::{self, HeaderName, InvalidHeaderValue};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};

use crate::auth::UpstreamCredential;

/// Organization header understood by OpenAI-compatible APIs
pub const OPENAI_ORGANIZATION: &str = "openai-organization";

/// Disables proxy buffering (nginx) so streamed completions flush promptly
pub const X_ACCEL_BUFFERING: &str = "x-accel-buffering";

/// Hop-by-hop headers that must never be forwarded
const HOP_BY_HOP_HEADERS: &[HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Build the headers sent upstream
pub fn build_upstream_headers(
    incoming: &HeaderMap,
    credential: &UpstreamCredential,
    org_id: Option<&str>,
) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    if let Some(accept) = incoming.get(header::ACCEPT) {
        headers.insert(header::ACCEPT, accept.clone());
    }

    if let Some(key) = credential.bearer() {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }

    if let Some(org) = org_id {
        headers.insert(OPENAI_ORGANIZATION, HeaderValue::from_str(org)?);
    }

    Ok(headers)
}

/// Check if a header is a hop-by-hop header that should not be forwarded
pub fn is_hop_by_hop_header(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(name)
}

/// Filter an upstream response's headers before relaying them
///
/// `www-authenticate` is dropped so browsers don't pop a basic-auth dialog
/// when the upstream answers 401.
pub fn filter_response_headers(response_headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::new();

    for (name, value) in response_headers {
        if !is_hop_by_hop_header(name) && *name != header::WWW_AUTHENTICATE {
            filtered.append(name.clone(), value.clone());
        }
    }

    filtered.insert(X_ACCEL_BUFFERING, HeaderValue::from_static("no"));
    filtered
}
