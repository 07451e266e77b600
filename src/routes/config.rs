//! Client configuration endpoint
//!
//! Tells the web client whether it has to ask for an access code and which
//! optional fields to show.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{config::ClientConfig, AppState};

/// Handler for `GET|POST /api/config`
pub async fn client_config(State(state): State<Arc<AppState>>) -> Json<ClientConfig> {
    Json(state.config.client_config())
}
