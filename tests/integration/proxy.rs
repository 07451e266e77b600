//! Proxy route integration tests
//!
//! - OPTIONS short-circuit
//! - Path allow-list
//! - Passthrough of bodies, statuses, and headers
//! - Upstream transport failures

use axum::http::{header, HeaderValue, Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{
    constants, stub_server, unreachable_server, with_access_code, with_bearer, ProxyHarness,
};
use crate::mocks::{StubUpstream, STREAM_BODY};

#[tokio::test]
async fn test_options_short_circuits_regardless_of_path_and_credentials() {
    let stub = StubUpstream::ok("{}");
    let server = stub_server(&[("CODE", constants::TEST_ACCESS_CODE)], stub.clone());

    for path in ["/api/openai/v1/chat/completions", "/api/openai/not/allowed"] {
        let response = server.method(Method::OPTIONS, path).await;

        response.assert_status_ok();
        let json: Value = response.json();
        assert_eq!(json, json!({ "body": "OK" }));
    }

    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_browser_preflight_gets_ok_body_and_cors_headers() {
    let stub = StubUpstream::ok("{}");
    let server = stub_server(&[("CODE", constants::TEST_ACCESS_CODE)], stub.clone());

    let response = server
        .method(Method::OPTIONS, "/api/openai/v1/chat/completions")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://chat.example.com"))
        .add_header(
            header::ACCESS_CONTROL_REQUEST_METHOD,
            HeaderValue::from_static("POST"),
        )
        .add_header(
            header::ACCESS_CONTROL_REQUEST_HEADERS,
            HeaderValue::from_static("authorization,content-type"),
        )
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json, json!({ "body": "OK" }));
    let headers = response.headers();
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "authorization,content-type"
    );
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_forbidden_path_never_reaches_upstream() {
    let stub = StubUpstream::ok("{}");
    let server = stub_server(&[("OPENAI_API_KEY", constants::TEST_SERVER_KEY)], stub.clone());

    for subpath in ["v1/files", "v1/Models", "v1/models/gpt-4", "dashboard/billing"] {
        let response = server.get(&format!("/api/openai/{}", subpath)).await;

        response.assert_status(StatusCode::FORBIDDEN);
        let json: Value = response.json();
        assert_eq!(json["error"], json!(true));
        assert_eq!(
            json["msg"],
            json!(format!("you are not allowed to request {}", subpath))
        );
    }

    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_forbidden_path_checked_before_access_code() {
    let stub = StubUpstream::ok("{}");
    let server = stub_server(&[("CODE", constants::TEST_ACCESS_CODE)], stub.clone());

    let response = server.post("/api/openai/v1/embeddings").await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_chat_body_is_byte_identical() {
    let harness = ProxyHarness::new(&[("OPENAI_API_KEY", constants::TEST_SERVER_KEY)]).await;
    let upstream_body = "{\"id\":\"chatcmpl-1\",  \"choices\":[{\"message\":{\"content\":\"héllo\"}}]}";
    harness.upstream.mock_chat_completion_raw(upstream_body).await;

    let response = harness
        .server
        .post("/api/openai/v1/chat/completions")
        .json(&json!({ "model": "gpt-3.5-turbo", "messages": [] }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), upstream_body);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let received = harness.upstream.received().await;
    assert_eq!(received.len(), 1);
    let sent: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(sent["model"], json!("gpt-3.5-turbo"));
}

#[tokio::test]
async fn test_server_key_replaces_access_code_upstream() {
    let harness = ProxyHarness::new(&[
        ("OPENAI_API_KEY", constants::TEST_SERVER_KEY),
        ("CODE", constants::TEST_ACCESS_CODE),
        ("OPENAI_ORG_ID", "org-test"),
    ])
    .await;
    harness.upstream.mock_chat_completion_raw("{}").await;

    let request = harness.server.post("/api/openai/v1/chat/completions");
    let response = with_access_code(request, constants::TEST_ACCESS_CODE)
        .json(&json!({ "model": "gpt-3.5-turbo" }))
        .await;

    response.assert_status_ok();

    let received = harness.upstream.received().await;
    let headers = &received[0].headers;
    assert_eq!(
        headers.get("authorization").unwrap(),
        format!("Bearer {}", constants::TEST_SERVER_KEY).as_str()
    );
    assert_eq!(headers.get("openai-organization").unwrap(), "org-test");
    assert_eq!(headers.get("cache-control").unwrap(), "no-store");
}

#[tokio::test]
async fn test_streamed_body_is_relayed() {
    let harness = ProxyHarness::new(&[("OPENAI_API_KEY", constants::TEST_SERVER_KEY)]).await;
    harness.upstream.mock_chat_completion_stream().await;

    let response = harness
        .server
        .post("/api/openai/v1/chat/completions")
        .json(&json!({ "model": "gpt-3.5-turbo", "stream": true }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), STREAM_BODY);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );
    assert_eq!(headers.get("x-accel-buffering").unwrap(), "no");
}

#[tokio::test]
async fn test_query_string_is_forwarded() {
    let harness = ProxyHarness::new(&[("OPENAI_API_KEY", constants::TEST_SERVER_KEY)]).await;
    let usage = r#"{"object":"list","total_usage":1234.5}"#;
    harness.upstream.mock_billing_usage(usage).await;

    let response = harness
        .server
        .get("/api/openai/dashboard/billing/usage")
        .add_query_param("start_date", "2024-01-01")
        .add_query_param("end_date", "2024-02-01")
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), usage);

    let received = harness.upstream.received().await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].url.path(), "/dashboard/billing/usage");
    let query: Vec<(String, String)> = received[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert!(query.contains(&("start_date".to_string(), "2024-01-01".to_string())));
    assert!(query.contains(&("end_date".to_string(), "2024-02-01".to_string())));
}

#[tokio::test]
async fn test_subscription_is_passed_through() {
    let harness = ProxyHarness::new(&[("OPENAI_API_KEY", constants::TEST_SERVER_KEY)]).await;
    let subscription = r#"{"hard_limit_usd":120.0,"has_payment_method":true}"#;
    harness.upstream.mock_billing_subscription(subscription).await;

    let response = harness
        .server
        .get("/api/openai/dashboard/billing/subscription")
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), subscription);
}

#[tokio::test]
async fn test_upstream_error_status_is_passed_through() {
    let harness = ProxyHarness::new(&[("OPENAI_API_KEY", constants::TEST_SERVER_KEY)]).await;
    harness.upstream.mock_chat_completion_rate_limited().await;

    let response = harness
        .server
        .post("/api/openai/v1/chat/completions")
        .json(&json!({ "model": "gpt-3.5-turbo" }))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get("retry-after").unwrap(), "60");
    let json: Value = response.json();
    assert_eq!(json["error"]["type"], json!("rate_limit_error"));
}

#[tokio::test]
async fn test_upstream_auth_challenge_is_removed() {
    let harness = ProxyHarness::new(&[]).await;
    harness.upstream.mock_list_models_unauthorized().await;

    let request = harness.server.get("/api/openai/v1/models");
    let response = with_bearer(request, "sk-invalid").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    let json: Value = response.json();
    assert_eq!(json["error"]["code"], json!("invalid_api_key"));
}

#[tokio::test]
async fn test_upstream_failure_becomes_diagnostic() {
    let stub = StubUpstream::failing();
    let server = stub_server(&[("OPENAI_API_KEY", constants::TEST_SERVER_KEY)], stub.clone());

    for (method, subpath) in [
        (Method::POST, "v1/chat/completions"),
        (Method::GET, "v1/models"),
        (Method::GET, "dashboard/billing/usage"),
    ] {
        let response = server
            .method(method, &format!("/api/openai/{}", subpath))
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        let json: Value = response.json();
        assert_eq!(json["error"], json!(true));

        let msg = json["msg"].as_str().unwrap();
        assert!(msg.starts_with("```json\n"), "diagnostic should be fenced: {}", msg);
        assert!(msg.contains("connection refused"));
        assert!(msg.contains(subpath));
    }

    assert_eq!(stub.calls(), 3);
}

#[tokio::test]
async fn test_unreachable_upstream_becomes_diagnostic() {
    let server = unreachable_server(&[("OPENAI_API_KEY", constants::TEST_SERVER_KEY)]);

    let response = server
        .post("/api/openai/v1/chat/completions")
        .json(&json!({ "model": "gpt-3.5-turbo" }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let json: Value = response.json();
    assert_eq!(json["error"], json!(true));
    assert!(json["msg"].as_str().unwrap().contains("127.0.0.1:1"));
}

fn chat_body_of_size(bytes: usize) -> Value {
    json!({
        "model": "gpt-4o",
        "messages": [{ "role": "user", "content": "a".repeat(bytes) }]
    })
}

#[tokio::test]
async fn test_large_chat_body_is_forwarded() {
    let stub = StubUpstream::ok(r#"{"id":"chatcmpl-big"}"#);
    let server = stub_server(&[("OPENAI_API_KEY", constants::TEST_SERVER_KEY)], stub.clone());

    let response = server
        .post("/api/openai/v1/chat/completions")
        .json(&chat_body_of_size(3 * 1024 * 1024))
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), r#"{"id":"chatcmpl-big"}"#);
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn test_body_over_limit_is_rejected_as_json() {
    let stub = StubUpstream::ok("{}");
    let server = stub_server(
        &[
            ("OPENAI_API_KEY", constants::TEST_SERVER_KEY),
            ("MAX_BODY_BYTES", "1024"),
        ],
        stub.clone(),
    );

    let response = server
        .post("/api/openai/v1/chat/completions")
        .json(&chat_body_of_size(4096))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let json: Value = response.json();
    assert_eq!(json["error"], json!(true));
    assert!(json["msg"].as_str().unwrap().contains("length limit exceeded"));
    assert_eq!(stub.calls(), 0);
}
