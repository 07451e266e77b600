//! Mock OpenAI-compatible upstream for testing
//!
//! Provides wiremock-based mocks for the operations the proxy forwards:
//! - GET /v1/models - List models
//! - POST /v1/chat/completions - Chat completions (JSON and SSE)
//! - GET /dashboard/billing/usage - Usage
//! - GET /dashboard/billing/subscription - Subscription

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

/// SSE body used by streaming mocks
pub const STREAM_BODY: &str = concat!(
    "data: {\"id\":\"chatcmpl-1\",\"object\":\"chat.completion.chunk\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hel\"}}]}\n\n",
    "data: {\"id\":\"chatcmpl-1\",\"object\":\"chat.completion.chunk\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo\"}}]}\n\n",
    "data: [DONE]\n\n"
);

/// Mock upstream server wrapper
pub struct MockOpenAi {
    server: MockServer,
}

impl MockOpenAi {
    /// Start a new mock upstream
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Get the mock server URI
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Requests the mock has received so far
    pub async fn received(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Build a `v1/models` payload for the given ids
    pub fn model_list(ids: &[&str]) -> Value {
        json!({
            "object": "list",
            "data": ids
                .iter()
                .map(|id| json!({
                    "id": id,
                    "object": "model",
                    "created": 1687882411,
                    "owned_by": "openai"
                }))
                .collect::<Vec<_>>()
        })
    }

    /// Mock successful model list
    pub async fn mock_list_models(&self, ids: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Self::model_list(ids)))
            .mount(&self.server)
            .await;
    }

    /// Mock model list with an exact raw body
    pub async fn mock_list_models_raw(&self, body: &str) {
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, "application/json"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock 401 for the model list, with a browser auth challenge
    pub async fn mock_list_models_unauthorized(&self) {
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({
                        "error": {
                            "message": "Incorrect API key provided",
                            "type": "invalid_request_error",
                            "code": "invalid_api_key"
                        }
                    }))
                    .insert_header("www-authenticate", "Basic realm=\"openai\""),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock chat completion returning an exact raw body
    pub async fn mock_chat_completion_raw(&self, body: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, "application/json"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock streaming chat completion (SSE)
    pub async fn mock_chat_completion_stream(&self) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(STREAM_BODY, "text/event-stream")
                    .insert_header("cache-control", "no-cache"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock 429 for chat completions
    pub async fn mock_chat_completion_rate_limited(&self) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(json!({
                        "error": {
                            "message": "Rate limit exceeded",
                            "type": "rate_limit_error"
                        }
                    }))
                    .insert_header("retry-after", "60"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock billing usage
    pub async fn mock_billing_usage(&self, body: &str) {
        Mock::given(method("GET"))
            .and(path("/dashboard/billing/usage"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, "application/json"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock billing subscription
    pub async fn mock_billing_subscription(&self, body: &str) {
        Mock::given(method("GET"))
            .and(path("/dashboard/billing/subscription"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, "application/json"),
            )
            .mount(&self.server)
            .await;
    }
}
