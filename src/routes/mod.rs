//! HTTP routes for chatgate
//!
//! This module defines all HTTP endpoints exposed by the proxy.

pub mod config;
pub mod health;
pub mod metrics;
pub mod openai;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::AppState;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // The handler answers OPTIONS itself, so the CORS layer stays off this route
    let proxy_routes = Router::new()
        .route(
            "/api/openai/*path",
            get(openai::openai_proxy)
                .post(openai::openai_proxy)
                .options(openai::openai_proxy),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static("*"),
                ))
                .layer(DefaultBodyLimit::max(state.config.max_body_bytes)),
        );

    let public_routes = Router::new()
        .route(
            "/api/config",
            get(config::client_config).post(config::client_config),
        )
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .layer(cors);

    Router::new()
        .merge(public_routes)
        .merge(proxy_routes)
        // Global middleware (applied to all routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
