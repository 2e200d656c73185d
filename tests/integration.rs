use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use photo_game_api::{api, app::App, models::Config};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "integration-boundary";

fn test_config(server: &MockServer, illustrations_enabled: bool) -> Config {
    Config {
        openai_api_key: Some("sk-test".to_string()),
        openai_base_url: server.uri(),
        illustrations_enabled,
        provider_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

fn png_upload_request(instruction: &str) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"toys.png\"\r\nContent-Type: image/png\r\n\r\n",
            b = BOUNDARY
        )
        .as_bytes(),
    );
    body.extend_from_slice(&[0x89, 0x50, 0x4E, 0x47, 0x0D]);
    body.extend_from_slice(
        format!(
            "\r\n--{b}\r\nContent-Disposition: form-data; name=\"instruction\"\r\n\r\n{i}\r\n--{b}--\r\n",
            b = BOUNDARY,
            i = instruction
        )
        .as_bytes(),
    );

    Request::builder()
        .method("POST")
        .uri("/api/generate-game")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(config: &Config, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let router = api::router(Arc::new(App::from_config(config)), config.max_upload_bytes);
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn responses_ok(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "output": [{
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "output_text", "text": text }]
        }]
    }))
}

fn chat_ok(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "choices": [{
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }]
    }))
}

#[tokio::test]
async fn test_upload_generates_plan_and_illustration() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains(
            "Please also incorporate: use only blue objects",
        ))
        .and(body_string_contains("data:image/png;base64,iVBORw0="))
        .respond_with(responses_ok("1. Gather the blue cups.\n2. Stack them."))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_ok("unused"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{ "b64_json": "iVBORw0KGgo=" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        &test_config(&server, true),
        png_upload_request("use only blue objects"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({
            "result": "1. Gather the blue cups.\n2. Stack them.",
            "illustration": "data:image/png;base64,iVBORw0KGgo="
        })
    );
}

#[tokio::test]
async fn test_primary_failure_falls_back_to_chat_completions() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(404).set_body_string("unknown endpoint"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("data:image/png;base64,iVBORw0="))
        .respond_with(chat_ok("Fallback plan"))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(&test_config(&server, false), png_upload_request("")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Fallback plan");
    assert!(body["illustration"].is_null());
}

#[tokio::test]
async fn test_both_transports_failing_is_502_without_illustration() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{ "b64_json": "iVBORw0KGgo=" }]
        })))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(&test_config(&server, true), png_upload_request("")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_illustration_error_does_not_change_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(responses_ok("Plan text"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(400).set_body_string("content policy"))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(&test_config(&server, true), png_upload_request("")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Plan text");
    assert!(body["illustration"].is_null());
}

#[tokio::test]
async fn test_json_remote_url_is_forwarded_to_provider() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains("https://example.com/toys.jpg"))
        .respond_with(responses_ok("Remote plan"))
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-game")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({
                "image_url": "https://example.com/toys.jpg",
                "topic": "shapes",
                "items": 4
            })
            .to_string(),
        ))
        .unwrap();

    let (status, body) = send(&test_config(&server, false), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Remote plan");
}

#[tokio::test]
async fn test_missing_api_key_is_500() {
    let server = MockServer::start().await;
    let config = Config {
        openai_api_key: None,
        ..test_config(&server, true)
    };

    let (status, body) = send(&config, png_upload_request("")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "OpenAI API key not configured");
    assert!(server.received_requests().await.unwrap().is_empty());
}

fn short_timeout_config(server: &MockServer) -> Config {
    Config {
        provider_timeout: Duration::from_secs(1),
        ..test_config(server, false)
    }
}

#[tokio::test]
async fn test_primary_timeout_falls_back_to_chat_completions_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(responses_ok("too late").set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_ok("Plan after timeout"))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(&short_timeout_config(&server), png_upload_request("")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Plan after timeout");
}

#[tokio::test]
async fn test_both_transports_timing_out_is_502() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(responses_ok("too late").set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_ok("too late").set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(&short_timeout_config(&server), png_upload_request("")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["detail"].is_string());
}
