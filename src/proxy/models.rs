//! Model-family gating
//!
//! When a model family is disabled, its models are hidden from the model list
//! and chat requests naming one of them are refused before they leave the
//! proxy.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    error::{AppError, AppResult},
    proxy::{OpenAiPath, UpstreamFailure, UpstreamResponse},
};

/// A model descriptor from the upstream list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Upstream `v1/models` payload; fields other than `data` are carried through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelList {
    pub data: Vec<ModelDescriptor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelList {
    /// Drop every model whose id starts with `prefix`
    pub fn without_family(mut self, prefix: &str) -> Self {
        self.data.retain(|model| !model.id.starts_with(prefix));
        self
    }

    pub fn ids(&self) -> Vec<&str> {
        self.data.iter().map(|m| m.id.as_str()).collect()
    }
}

#[derive(Debug, Deserialize)]
struct RequestedModel {
    model: Option<String>,
}

/// Reject a request body whose `model` belongs to the disabled family
///
/// Bodies that aren't JSON objects, or carry no model, are let through.
pub fn check_requested_model(body: &[u8], disabled_prefix: Option<&str>) -> AppResult<()> {
    let Some(prefix) = disabled_prefix else {
        return Ok(());
    };

    let model = serde_json::from_slice::<RequestedModel>(body)
        .ok()
        .and_then(|r| r.model);

    match model {
        Some(model) if model.starts_with(prefix) => {
            warn!(model = %model, prefix = %prefix, "Refusing request for disabled model");
            Err(AppError::ForbiddenModel(model))
        }
        _ => Ok(()),
    }
}

/// Shape a successful `v1/models` response
///
/// Without a disabled family the upstream response is returned untouched.
pub async fn filter_model_list(
    response: UpstreamResponse,
    disabled_prefix: Option<&str>,
) -> AppResult<Response> {
    let Some(prefix) = disabled_prefix else {
        return Ok(response.into_response());
    };

    let status = response.status;
    let bytes = response
        .body
        .collect()
        .await
        .map_err(|e| {
            UpstreamFailure::new("failed to read model list", OpenAiPath::ListModels.as_str())
                .with_cause(e.to_string())
        })?
        .to_bytes();

    let list: ModelList = serde_json::from_slice(&bytes).map_err(|e| {
        UpstreamFailure::new("invalid model list", OpenAiPath::ListModels.as_str())
            .with_cause(e.to_string())
    })?;

    let before = list.data.len();
    let list = list.without_family(prefix);
    debug!(
        prefix = %prefix,
        removed = before - list.data.len(),
        remaining = list.data.len(),
        "Filtered model list"
    );

    Ok((status, Json(list)).into_response())
}
