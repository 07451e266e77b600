//! OpenAI proxy route
//!
//! `/api/openai/*path` relays allow-listed operations to the upstream API.
//! A request moves through these checks in order, and any failure ends it
//! before the upstream is contacted:
//!
//! 1. OPTIONS short-circuits with `{"body": "OK"}`, preflight or not
//! 2. the sub-path must be allow-listed
//! 3. the access gate must authorize the caller
//! 4. the body must fit the configured limit
//! 5. the requested model must not belong to a disabled family
//!
//! Successful `v1/models` responses are then filtered; everything else is
//! passed through as received.

use std::sync::Arc;

use axum::{
    extract::{rejection::BytesRejection, Path, RawQuery, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::json;
use tracing::Instrument;

use crate::{
    auth,
    error::{AppError, AppResult},
    proxy::{
        models::{check_requested_model, filter_model_list},
        OpenAiPath, RequestContext, UpstreamRequest,
    },
    routes::metrics::{record_rejection, record_request},
    AppState,
};

/// Handler for `GET|POST|OPTIONS /api/openai/*path`
pub async fn openai_proxy(
    State(state): State<Arc<AppState>>,
    Path(subpath): Path<String>,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if method == Method::OPTIONS {
        return (
            StatusCode::OK,
            preflight_headers(&headers),
            Json(json!({ "body": "OK" })),
        )
            .into_response();
    }

    let ctx = RequestContext::new(method.as_str(), &subpath);
    let span = ctx.create_span();
    // Unknown sub-paths share one label to keep metric cardinality bounded
    let path_label = OpenAiPath::from_subpath(&subpath)
        .map(OpenAiPath::as_str)
        .unwrap_or("other");

    async move {
        match proxy(&state, &ctx, method, subpath, query, headers, body).await {
            Ok(response) => {
                let status_label = if response.status().is_success() {
                    "success"
                } else {
                    "error"
                };
                record_request(status_label, path_label, ctx.elapsed_secs());
                response
            }
            Err(err) => {
                ctx.log_failed(err.kind(), &err.to_string());
                record_rejection(err.kind(), path_label);
                record_request("error", path_label, ctx.elapsed_secs());
                err.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn proxy(
    state: &AppState,
    ctx: &RequestContext,
    method: Method,
    subpath: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Response> {
    if !state.allow_list.is_allowed(&subpath) {
        return Err(AppError::ForbiddenPath(subpath));
    }

    let credential = auth::authorize(&headers, &state.config)?;
    let body = body?;

    let disabled_prefix = state.config.disabled_model_prefix.as_deref();
    check_requested_model(&body, disabled_prefix)?;

    let is_list_models = OpenAiPath::from_subpath(&subpath) == Some(OpenAiPath::ListModels);
    let request = UpstreamRequest {
        method,
        subpath,
        query,
        headers,
        body,
        credential,
    };

    let response = state.upstream.forward(request).await.map_err(|failure| {
        ctx.log_upstream_failure(state.upstream.name(), &failure.to_string());
        failure
    })?;
    ctx.log_upstream_response(state.upstream.name(), response.status.as_u16());

    if is_list_models && response.status == StatusCode::OK {
        return filter_model_list(response, disabled_prefix).await;
    }

    Ok(response.into_response())
}

/// CORS answer for OPTIONS, echoing the headers a browser asks to send
fn preflight_headers(request_headers: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    let allowed = request_headers
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, allowed);
    headers
}
