use super::*;
use httpmock::prelude::*;

fn notifier(base_url: String, max_attempts: u32) -> TelegramNotifier {
    let config = TelegramConfig {
        enabled: true,
        bot_token: "123:abc".to_string(),
        chat_id: "-100200".to_string(),
        max_attempts,
        retry_delay_secs: 0,
        base_url,
    };
    TelegramNotifier::new(config, "Doraymon")
}

#[test]
fn test_format_prefix() {
    let n = notifier("http://localhost".into(), 3);
    assert_eq!(
        n.format(Severity::Warning, "<b>WhatsApp disconnected</b>"),
        "Doraymon: [WARNING] <b>WhatsApp disconnected</b>"
    );
}

#[test]
fn test_base_url_includes_token() {
    let n = notifier("https://api.telegram.org/".into(), 3);
    assert_eq!(n.base_url, "https://api.telegram.org/bot123:abc");
}

#[tokio::test]
async fn test_notify_sends_html() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/bot123:abc/sendMessage")
                .json_body(serde_json::json!({
                    "chat_id": "-100200",
                    "text": "Doraymon: [INFO] <b>initialize client WhatsApp</b>",
                    "parse_mode": "HTML",
                }));
            then.status(200).json_body(serde_json::json!({ "ok": true }));
        })
        .await;

    notifier(server.base_url(), 3)
        .notify(Severity::Info, "<b>initialize client WhatsApp</b>")
        .await;
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_notify_retries_then_gives_up() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/bot123:abc/sendMessage");
            then.status(500).body("boom");
        })
        .await;

    notifier(server.base_url(), 3)
        .notify(Severity::Error, "sheet unreachable")
        .await;
    mock.assert_hits_async(3).await;
}

#[tokio::test]
async fn test_notify_chunks_long_messages() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/bot123:abc/sendMessage");
            then.status(200);
        })
        .await;

    let long = "line\n".repeat(1500);
    notifier(server.base_url(), 1)
        .notify(Severity::Warning, &long)
        .await;
    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_notify_photo_multipart() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/bot123:abc/sendPhoto")
                .body_contains("name=\"photo\"")
                .body_contains("scan me");
            then.status(200);
        })
        .await;

    notifier(server.base_url(), 2)
        .notify_photo(b"fake-png", "scan me")
        .await;
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_zero_attempts_still_tries_once() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/bot123:abc/sendMessage");
            then.status(500);
        })
        .await;

    notifier(server.base_url(), 0)
        .notify(Severity::Info, "x")
        .await;
    mock.assert_hits_async(1).await;
}
