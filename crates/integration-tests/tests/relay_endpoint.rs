//! `POST /send-message` through the router, with bot and webhook delivery.

use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::{Multipart, State};
use axum::http::{Request, StatusCode, header};
use axum::Router;
use axum::routing::post;
use nonogram_relay_bot::config::CorsConfig;
use nonogram_relay_bot::routes;
use nonogram_relay_bot::services::{BotDelivery, RelayDelivery, WebhookDelivery};
use nonogram_relay_bot::state::AppState;
use nonogram_relay_bot::testing::{FakeChat, MemoryRepository, user};
use nonogram_relay_core::ChannelId;
use nonogram_relay_integration_tests::{BOT_ID, channel};
use secrecy::SecretString;
use tower::ServiceExt;

const BOUNDARY: &str = "integration-boundary";

fn relay_request(payload: Option<&str>, file: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(payload) = payload {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"payload_json\"\r\n\r\n{payload}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/send-message")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("valid request")
}

fn app(delivery: Arc<dyn RelayDelivery>) -> Router {
    let state = AppState::new(Arc::new(MemoryRepository::new()), delivery);
    routes::router(state, &CorsConfig::default())
}

#[tokio::test]
async fn test_bot_delivery_sends_exactly_once() {
    let chat = Arc::new(FakeChat::new(user(BOT_ID, "relay", true)).with_channel(channel()));
    let app = app(Arc::new(BotDelivery::new(chat.clone(), channel())));

    let response = app
        .oneshot(relay_request(
            Some(r#"{"content":"Fresh puzzle","embeds":[{"title":"Cat","fields":[{"name":"ID","value":"puzzle_3"}]}]}"#),
            Some(("cat.png", b"\x89PNG")),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);

    let sent = chat.sent();
    assert_eq!(sent.len(), 1);
    let (to, message) = &sent[0];
    assert_eq!(to, &channel());
    assert_eq!(message.content, "Fresh puzzle");
    assert_eq!(message.embeds[0]["title"], "Cat");
    let attachment = message.attachment.as_ref().expect("attachment");
    assert_eq!(attachment.filename, "cat.png");
    assert_eq!(attachment.bytes, b"\x89PNG");
}

#[tokio::test]
async fn test_unresolvable_channel_is_not_found() {
    let chat = Arc::new(FakeChat::new(user(BOT_ID, "relay", true)));
    let app = app(Arc::new(BotDelivery::new(
        chat.clone(),
        ChannelId::from("123"),
    )));

    let response = app
        .oneshot(relay_request(Some(r#"{"content":"hi"}"#), None))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(chat.sent().is_empty());
}

#[tokio::test]
async fn test_missing_payload_is_bad_request() {
    let chat = Arc::new(FakeChat::new(user(BOT_ID, "relay", true)).with_channel(channel()));
    let app = app(Arc::new(BotDelivery::new(chat.clone(), channel())));

    let response = app
        .oneshot(relay_request(None, Some(("cat.png", b"data"))))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(chat.sent().is_empty());
}

/// What the fake webhook received: `payload_json` text and file name/bytes.
type Captured = Arc<Mutex<Vec<(String, Option<(String, Bytes)>)>>>;

async fn capture_webhook(State(captured): State<Captured>, mut multipart: Multipart) -> StatusCode {
    let mut payload = String::new();
    let mut file = None;
    while let Some(field) = multipart.next_field().await.expect("multipart") {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("payload_json") => payload = field.text().await.expect("text"),
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                file = Some((name, field.bytes().await.expect("bytes")));
            }
            _ => {}
        }
    }
    captured.lock().expect("lock").push((payload, file));
    StatusCode::NO_CONTENT
}

/// Serve a fake webhook on an ephemeral port and return its URL.
async fn spawn_webhook(status_ok: bool) -> (String, Captured) {
    let captured: Captured = Arc::default();
    let router = if status_ok {
        Router::new()
            .route("/webhook", post(capture_webhook))
            .with_state(captured.clone())
    } else {
        Router::new().route("/webhook", post(|| async { StatusCode::BAD_REQUEST }))
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });

    (format!("http://{addr}/webhook"), captured)
}

#[tokio::test]
async fn test_webhook_delivery_reencodes_payload() {
    let (url, captured) = spawn_webhook(true).await;
    let app = app(Arc::new(WebhookDelivery::new(SecretString::from(url))));

    let response = app
        .oneshot(relay_request(
            Some(r#"{"embeds":[{"description":"ID: puzzle_5"}]}"#),
            Some(("grid.bin", b"abc")),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);

    let captured = captured.lock().expect("lock").clone();
    assert_eq!(captured.len(), 1);
    let (payload, file) = &captured[0];
    let payload: serde_json::Value = serde_json::from_str(payload).expect("json");
    assert_eq!(payload["content"], "");
    assert_eq!(payload["embeds"][0]["description"], "ID: puzzle_5");
    let (name, bytes) = file.as_ref().expect("file");
    assert_eq!(name, "grid.bin");
    assert_eq!(&bytes[..], b"abc");
}

#[tokio::test]
async fn test_webhook_failure_is_server_error() {
    let (url, _) = spawn_webhook(false).await;
    let app = app(Arc::new(WebhookDelivery::new(SecretString::from(url))));

    let response = app
        .oneshot(relay_request(Some(r#"{"content":"hi"}"#), None))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
