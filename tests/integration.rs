#![cfg(test)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use keyword_bot::{
    base::{
        config::{AccountConfig, ChannelCredentials, Config, ConfigInner},
        types::{FallbackMode, KeywordDefinition, OutboundMessage, Void},
    },
    interaction::{keyword::KeywordBook, webhook::WebhookAccount},
    runtime::Runtime,
    service::chat::{ChatClient, GenericChatClient, line},
};
use mockall::mock;
use tower::ServiceExt;

const SECRET: &str = "channel-secret-a";
const BASE_URL: &str = "https://bot.example.com";

// Mocks.

// Mock chat client for testing.

mock! {
    pub Chat {}

    #[async_trait]
    impl GenericChatClient for Chat {
        async fn reply_message(&self, reply_token: &str, messages: &[OutboundMessage]) -> Void;
    }
}

type Calls = Arc<Mutex<Vec<(String, Vec<OutboundMessage>)>>>;

/// A mock that records every reply, failing the ones addressed to `fail_token`.
fn recording_chat(calls: &Calls, fail_token: Option<&'static str>) -> MockChat {
    let mut mock = MockChat::new();
    let calls = calls.clone();

    mock.expect_reply_message().returning(move |reply_token, messages| {
        calls.lock().unwrap().push((reply_token.to_string(), messages.to_vec()));

        if Some(reply_token) == fail_token { Err(anyhow::anyhow!("LINE reply failed (400): invalid reply token")) } else { Ok(()) }
    });

    mock
}

/// A mock that must never be called.
fn silent_chat() -> MockChat {
    let mut mock = MockChat::new();
    mock.expect_reply_message().never();
    mock
}

/// Account `a` is linked to `chat`; account `b` has no credentials.
fn setup_runtime(chat: MockChat, fallback_mode: FallbackMode) -> Runtime {
    let config = Config::from(ConfigInner {
        public_base_url: BASE_URL.to_string(),
        accounts: vec![AccountConfig::new("a", "/webhook/a", "A", fallback_mode), AccountConfig::new("b", "/webhook/b", "B", FallbackMode::FixedMessage)],
        ..Default::default()
    });

    let book = Arc::new(KeywordBook::from_config(&config).unwrap());
    let chat = ChatClient::new(Arc::new(chat));

    let accounts = vec![WebhookAccount::linked(&config.accounts[0], &config, book.clone(), SECRET, chat), WebhookAccount::unlinked(&config.accounts[1])];

    Runtime { config, book, accounts }
}

fn text_event(reply_token: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "message",
        "mode": "active",
        "timestamp": 1700000000000u64,
        "source": { "type": "user", "userId": "U0123" },
        "webhookEventId": format!("evt-{reply_token}"),
        "replyToken": reply_token,
        "message": { "id": "1", "type": "text", "text": text }
    })
}

fn sticker_event(reply_token: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "message",
        "replyToken": reply_token,
        "message": { "id": "2", "type": "sticker", "packageId": "446", "stickerId": "1988" }
    })
}

fn batch(events: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({ "destination": "Ubot", "events": events })
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Posts a correctly signed body.
async fn post_signed(app: Router, path: &str, payload: serde_json::Value) -> (StatusCode, String) {
    let body = payload.to_string();
    let signature = line::sign(SECRET, body.as_bytes()).unwrap();

    let request = Request::post(path)
        .header("content-type", "application/json")
        .header(line::SIGNATURE_HEADER, signature)
        .body(Body::from(body))
        .unwrap();

    send(app, request).await
}

fn recorded(calls: &Calls) -> Vec<(String, Vec<OutboundMessage>)> {
    calls.lock().unwrap().clone()
}

#[tokio::test]
async fn test_keyword_replies_with_text_then_image() {
    let calls = Calls::default();
    let runtime = setup_runtime(recording_chat(&calls, None), FallbackMode::Silent);

    let (status, body) = post_signed(runtime.router(), "/webhook/a", batch(vec![text_event("r1", "成功")])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let calls = recorded(&calls);
    assert_eq!(calls.len(), 1);

    let (reply_token, messages) = &calls[0];
    assert_eq!(reply_token, "r1");
    assert_eq!(
        messages,
        &vec![
            OutboundMessage::text("🏆 成功模式啟動中。\n不急著衝刺，但每一步都算數。"),
            OutboundMessage::Image {
                original_content_url: "https://bot.example.com/images/success.png".to_string(),
                preview_image_url: "https://bot.example.com/images/success.png".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn test_alias_with_whitespace_resolves_to_keyword() {
    let calls = Calls::default();
    let runtime = setup_runtime(recording_chat(&calls, None), FallbackMode::Silent);

    let (status, _) = post_signed(runtime.router(), "/webhook/a", batch(vec![text_event("r1", " 發財 ")])).await;

    assert_eq!(status, StatusCode::OK);

    let calls = recorded(&calls);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1[1], OutboundMessage::image("https://bot.example.com/images/rich.png"));
}

#[tokio::test]
async fn test_unknown_keyword_is_silent() {
    let runtime = setup_runtime(silent_chat(), FallbackMode::Silent);

    let (status, body) = post_signed(runtime.router(), "/webhook/a", batch(vec![text_event("r1", "隨便")])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_unknown_keyword_gets_fixed_message() {
    let calls = Calls::default();
    let runtime = setup_runtime(recording_chat(&calls, None), FallbackMode::FixedMessage);

    let (status, _) = post_signed(runtime.router(), "/webhook/a", batch(vec![text_event("r1", "隨便")])).await;

    assert_eq!(status, StatusCode::OK);

    let calls = recorded(&calls);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, vec![OutboundMessage::text("請輸入以下關鍵字之一：成功、業績、有錢、好運")]);
}

#[tokio::test]
async fn test_batch_replies_only_to_matching_text_events() {
    let calls = Calls::default();
    let runtime = setup_runtime(recording_chat(&calls, None), FallbackMode::Silent);

    let events = vec![text_event("r1", "好運"), sticker_event("r2"), text_event("r3", "爆單")];
    let (status, body) = post_signed(runtime.router(), "/webhook/a", batch(events)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    // Order between events is not guaranteed.
    let mut tokens = recorded(&calls).into_iter().map(|(token, _)| token).collect::<Vec<_>>();
    tokens.sort();
    assert_eq!(tokens, vec!["r1", "r3"]);
}

#[tokio::test]
async fn test_non_message_events_are_ignored() {
    let runtime = setup_runtime(silent_chat(), FallbackMode::FixedMessage);

    let events = vec![
        serde_json::json!({ "type": "follow", "replyToken": "r1", "source": { "type": "user", "userId": "U0123" } }),
        serde_json::json!({ "type": "unfollow", "source": { "type": "user", "userId": "U0123" } }),
        sticker_event("r2"),
    ];
    let (status, _) = post_signed(runtime.router(), "/webhook/a", batch(events)).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_empty_body_is_an_empty_batch() {
    let runtime = setup_runtime(silent_chat(), FallbackMode::FixedMessage);

    let (status, body) = post_signed(runtime.router(), "/webhook/a", serde_json::json!({ "destination": "Ubot" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_one_failed_reply_fails_the_batch() {
    let calls = Calls::default();
    let runtime = setup_runtime(recording_chat(&calls, Some("r1")), FallbackMode::Silent);

    let events = vec![text_event("r1", "成功"), text_event("r2", "業績")];
    let (status, body) = post_signed(runtime.router(), "/webhook/a", batch(events)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "ERR");

    // The other event was still answered.
    assert_eq!(recorded(&calls).len(), 2);
}

#[tokio::test]
async fn test_missing_credentials_only_report() {
    let runtime = setup_runtime(silent_chat(), FallbackMode::Silent);

    let request = Request::post("/webhook/b").header("content-type", "application/json").body(Body::from("not even json")).unwrap();
    let (status, body) = send(runtime.router(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Webhook /webhook/b OK, but B keys missing.");

    let (status, body) = post_signed(runtime.router(), "/webhook/b", batch(vec![text_event("r1", "成功")])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Webhook /webhook/b OK, but B keys missing.");
}

#[tokio::test]
async fn test_invalid_signature_is_rejected() {
    let runtime = setup_runtime(silent_chat(), FallbackMode::FixedMessage);
    let body = batch(vec![text_event("r1", "成功")]).to_string();

    // Signed with the wrong secret.
    let signature = line::sign("someone-else", body.as_bytes()).unwrap();
    let request = Request::post("/webhook/a").header(line::SIGNATURE_HEADER, signature).body(Body::from(body.clone())).unwrap();
    let (status, _) = send(runtime.router(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // No signature at all.
    let request = Request::post("/webhook/a").body(Body::from(body)).unwrap();
    let (status, _) = send(runtime.router(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_body_is_rejected() {
    let runtime = setup_runtime(silent_chat(), FallbackMode::FixedMessage);

    let body = "{\"events\": [";
    let signature = line::sign(SECRET, body.as_bytes()).unwrap();
    let request = Request::post("/webhook/a").header(line::SIGNATURE_HEADER, signature).body(Body::from(body)).unwrap();
    let (status, _) = send(runtime.router(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_reports_accounts() {
    let runtime = setup_runtime(silent_chat(), FallbackMode::Silent);

    let request = Request::get("/").body(Body::empty()).unwrap();
    let (status, body) = send(runtime.router(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "LINE bot running ✅\nPUBLIC_BASE_URL=https://bot.example.com\nA_KEYS=SET\nB_KEYS=MISSING\n");
}

#[tokio::test]
async fn test_images_are_served_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("success.png"), b"png bytes").unwrap();

    let mut runtime = setup_runtime(silent_chat(), FallbackMode::Silent);
    runtime.config = Config::from(ConfigInner {
        images_dir: dir.path().to_string_lossy().into_owned(),
        ..(*runtime.config.inner).clone()
    });

    let request = Request::get("/images/success.png").body(Body::empty()).unwrap();
    let (status, body) = send(runtime.router(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "png bytes");

    let request = Request::get("/images/missing.png").body(Body::empty()).unwrap();
    let (status, _) = send(runtime.router(), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_runtime_links_only_accounts_with_credentials() {
    let mut inner = ConfigInner::default();
    inner.credentials.insert(
        "A".to_string(),
        ChannelCredentials {
            channel_secret: SECRET.to_string(),
            channel_access_token: "token-a".to_string(),
        },
    );

    let runtime = Runtime::new(Config::from(inner)).unwrap();

    assert_eq!(runtime.accounts.len(), 2);
    assert!(runtime.accounts[0].is_linked());
    assert!(!runtime.accounts[1].is_linked());
}

#[tokio::test]
async fn test_runtime_rejects_open_alias_table() {
    let mut inner = ConfigInner {
        keywords: vec![KeywordDefinition::new("成功", "success.png", "yay")],
        ..Default::default()
    };
    inner.aliases.clear();
    inner.aliases.insert("大吉大利".to_string(), "好運".to_string());

    assert!(Runtime::new(Config::from(inner)).is_err());
}
