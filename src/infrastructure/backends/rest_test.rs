use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;

use super::validate_token;
use super::RestBackend;
use crate::domain::models::AttachmentUpload;
use crate::domain::models::Backend;
use crate::domain::models::ChatDelta;
use crate::domain::models::ChatPrompt;
use crate::domain::models::Event;

impl RestBackend {
    fn with_url(url: String) -> RestBackend {
        return RestBackend {
            url,
            token: "abc".to_string(),
            idle_timeout: Duration::from_millis(5000),
        };
    }

    fn without_token(url: String) -> RestBackend {
        return RestBackend {
            url,
            token: "".to_string(),
            idle_timeout: Duration::from_millis(5000),
        };
    }
}

fn prompt(message: &str, user_id: &str) -> ChatPrompt {
    return ChatPrompt::new(message, user_id, None);
}

fn to_delta(event: Option<Event>) -> Result<ChatDelta> {
    let delta = match event.unwrap() {
        Event::AssistantDelta(delta) => delta,
        _ => bail!("Wrong type from recv"),
    };

    return Ok(delta);
}

#[test]
fn it_accepts_missing_and_wellformed_tokens() {
    assert!(validate_token("").is_ok());
    assert!(validate_token("abc.def-123").is_ok());
}

#[test]
fn it_fails_closed_on_malformed_tokens() {
    assert!(validate_token("two words").is_err());
    assert!(validate_token("line\nbreak").is_err());
    assert!(validate_token(&"a".repeat(5000)).is_err());
}

#[tokio::test]
async fn it_streams_chat_chunks_in_order() -> Result<()> {
    let body = [
        "data: {\"chunk\": \"Hi\"}",
        "not an event line",
        "data: {\"unrelated\": true}",
        "data: not-json",
        "data: {\"chunk\": \" there\"}",
        "data: {\"chunk\": \"!\"}",
        "data: [DONE]",
    ]
    .join("\n");

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/ai/stream")
        .match_header("Authorization", "Bearer abc")
        .with_status(200)
        .with_body(body)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let backend = RestBackend::with_url(server.url());
    let sent = prompt("Hello", "user-1");
    let request_id = sent.request_id;
    backend.stream_chat(sent, &tx).await?;

    mock.assert();

    let first = to_delta(rx.recv().await)?;
    let second = to_delta(rx.recv().await)?;
    let third = to_delta(rx.recv().await)?;
    let last = to_delta(rx.recv().await)?;

    assert_eq!(first.text, "Hi");
    assert!(!first.done);
    assert_eq!(first.request_id, request_id);
    assert_eq!(second.text, " there");
    assert_eq!(third.text, "!");
    assert!(last.done);
    assert!(last.text.is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_completes_on_eof_without_sentinel() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/ai/stream")
        .with_status(200)
        .with_body("data: {\"chunk\": \"partial\"}\n")
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let backend = RestBackend::with_url(server.url());
    backend.stream_chat(prompt("Hello", "user-1"), &tx).await?;

    mock.assert();

    let first = to_delta(rx.recv().await)?;
    let last = to_delta(rx.recv().await)?;
    assert_eq!(first.text, "partial");
    assert!(last.done);

    return Ok(());
}

#[tokio::test]
async fn it_surfaces_server_error_messages() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/ai/stream")
        .with_status(500)
        .with_body("{\"error\": \"model overloaded\"}")
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let backend = RestBackend::with_url(server.url());
    let res = backend.stream_chat(prompt("Hello", "user-1"), &tx).await;

    mock.assert();
    assert!(res.is_err());
    assert_eq!(res.unwrap_err().to_string(), "model overloaded");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn it_falls_back_to_generic_http_errors() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/ai/stream")
        .with_status(500)
        .create();

    let (tx, _rx) = mpsc::unbounded_channel::<Event>();
    let backend = RestBackend::with_url(server.url());
    let res = backend.stream_chat(prompt("Hello", "user-1"), &tx).await;

    mock.assert();
    assert_eq!(res.unwrap_err().to_string(), "HTTP error! status: 500");
}

#[tokio::test]
async fn it_requires_a_user_id() {
    let (tx, _rx) = mpsc::unbounded_channel::<Event>();
    let backend = RestBackend::with_url("http://localhost:9".to_string());
    let res = backend.stream_chat(prompt("Hello", ""), &tx).await;

    assert!(res.is_err());
    assert!(res.unwrap_err().to_string().contains("user id"));
}

#[tokio::test]
async fn it_rejects_empty_messages() {
    let (tx, _rx) = mpsc::unbounded_channel::<Event>();
    let backend = RestBackend::with_url("http://localhost:9".to_string());
    let res = backend.stream_chat(prompt("", "user-1"), &tx).await;

    assert!(res.is_err());
}

#[tokio::test]
async fn it_degrades_to_unauthenticated_without_token() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/ai/stream")
        .match_header("Authorization", mockito::Matcher::Missing)
        .with_status(200)
        .with_body("data: [DONE]\n")
        .create();

    let (tx, _rx) = mpsc::unbounded_channel::<Event>();
    let backend = RestBackend::without_token(server.url());
    backend.stream_chat(prompt("Hello", "user-1"), &tx).await?;

    mock.assert();
    return Ok(());
}

#[tokio::test]
async fn it_chats_without_streaming() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/ai/chat")
        .match_header("Authorization", "Bearer abc")
        .with_status(200)
        .with_body("{\"response\": \"Hi there!\"}")
        .create();

    let backend = RestBackend::with_url(server.url());
    let res = backend.chat(prompt("Hello", "user-1")).await?;

    mock.assert();
    assert_eq!(res, "Hi there!");
    return Ok(());
}

#[tokio::test]
async fn it_fetches_history() -> Result<()> {
    let body = r#"{"history": [
        {"role": "user", "parts": "What is my profit?"},
        {"id": 7, "role": "model", "parts": "Your profit is $100.00."}
    ]}"#;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/ai/history/user-1")
        .with_status(200)
        .with_body(body)
        .create();

    let backend = RestBackend::with_url(server.url());
    let res = backend.history("user-1").await?;

    mock.assert();
    assert_eq!(res.len(), 2);
    assert_eq!(res[0].role, "user");
    assert_eq!(res[1].id, Some(7));
    assert_eq!(res[1].parts, "Your profit is $100.00.");
    return Ok(());
}

#[tokio::test]
async fn it_clears_history_idempotently() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("DELETE", "/api/ai/history/user-1")
        .with_status(200)
        .expect(2)
        .create();

    let backend = RestBackend::with_url(server.url());
    backend.clear_history("user-1").await?;
    backend.clear_history("user-1").await?;

    mock.assert();
    return Ok(());
}

#[tokio::test]
async fn it_treats_missing_history_as_cleared() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("DELETE", "/api/ai/history/user-1")
        .with_status(404)
        .create();

    let backend = RestBackend::with_url(server.url());
    backend.clear_history("user-1").await?;

    mock.assert();
    return Ok(());
}

#[tokio::test]
async fn it_lists_conversations() -> Result<()> {
    let body = r#"{"conversations": [
        {"date": "2024-03-01", "messageCount": 6, "preview": "What is my profit?", "lastMessage": "Anything else?"}
    ]}"#;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/ai/conversations/user-1")
        .with_status(200)
        .with_body(body)
        .create();

    let backend = RestBackend::with_url(server.url());
    let res = backend.conversations("user-1").await?;

    mock.assert();
    assert_eq!(res.len(), 1);
    assert_eq!(res[0].date, "2024-03-01");
    assert_eq!(res[0].message_count, 6);
    assert_eq!(res[0].last_message, "Anything else?");
    return Ok(());
}

#[tokio::test]
async fn it_analyzes_images() -> Result<()> {
    let body = r#"{"success": true, "data": {
        "amount": 12.5, "vendor": "Coffee Corner", "date": "2024-03-01",
        "category": "Meals", "description": "Team coffee", "confidence": 0.92
    }}"#;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/ai/analyze-image")
        .match_header("Authorization", "Bearer abc")
        .with_status(200)
        .with_body(body)
        .create();

    let backend = RestBackend::with_url(server.url());
    let res = backend
        .analyze_image("data:image/png;base64,aGk=", "user-1")
        .await?;

    mock.assert();
    assert_eq!(res.vendor, "Coffee Corner");
    assert_eq!(res.amount, 12.5);
    return Ok(());
}

#[tokio::test]
async fn it_rejects_failed_image_analysis() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/ai/analyze-image")
        .with_status(200)
        .with_body("{\"success\": false, \"error\": \"Unreadable receipt\"}")
        .create();

    let backend = RestBackend::with_url(server.url());
    let res = backend
        .analyze_image("data:image/png;base64,aGk=", "user-1")
        .await;

    mock.assert();
    assert_eq!(res.unwrap_err().to_string(), "Unreadable receipt");
}

#[tokio::test]
async fn it_analyzes_documents() -> Result<()> {
    let body = r#"{"success": true, "data": {
        "filename": "march.csv", "imported": 14, "skipped": 2,
        "errors": ["row 7: missing amount"]
    }}"#;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/documents/analyze")
        .with_status(200)
        .with_body(body)
        .create();

    let backend = RestBackend::with_url(server.url());
    let res = backend
        .analyze_document(AttachmentUpload {
            filename: "march.csv".to_string(),
            mime: "text/csv".to_string(),
            bytes: b"date,amount\n".to_vec(),
        })
        .await?;

    mock.assert();
    assert_eq!(res.imported, 14);
    assert_eq!(res.skipped, 2);
    assert_eq!(res.errors.len(), 1);
    return Ok(());
}

#[tokio::test]
async fn it_fetches_transaction_summaries() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/transactions/summary/user-1")
        .with_status(200)
        .with_body("{\"revenue\": 1500.0, \"expenses\": 400.0, \"profit\": 1100.0}")
        .create();

    let backend = RestBackend::with_url(server.url());
    let res = backend.transaction_summary("user-1").await?;

    mock.assert();
    assert_eq!(res.revenue, 1500.0);
    assert_eq!(res.profit, 1100.0);
    return Ok(());
}

#[tokio::test]
async fn it_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/api/health").with_status(200).create();

    let backend = RestBackend::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_ok());
    mock.assert();
}

#[tokio::test]
async fn it_fails_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/api/health").with_status(500).create();

    let backend = RestBackend::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_err());
    mock.assert();
}
