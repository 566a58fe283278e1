mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use hookchat_shared::constants::{REPLY_UNPARSEABLE, REPLY_WEBHOOK_UNAVAILABLE};
use serde_json::json;

fn auth_header(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        format!("Bearer {}", token).parse().unwrap(),
    )
}

async fn setup() -> (TestServer, sqlx::SqlitePool, String, String) {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool.clone());
    let server = TestServer::new(app).unwrap();
    let (user_id, token) = common::create_test_user(&pool, "alice@test.com", "pass12345").await;
    (server, pool, user_id, token)
}

async fn chat_rows(pool: &sqlx::SqlitePool, chat_id: &str) -> Vec<(String, Option<String>)> {
    sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT role, content FROM messages WHERE chat_id = ? ORDER BY created_at ASC, rowid ASC",
    )
    .bind(chat_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn list_messages_of_unowned_chat_is_404() {
    let (server, pool, _uid, token) = setup().await;
    let (bob, _) = common::create_test_user(&pool, "bob@test.com", "pass12345").await;
    let bob_chat = common::create_test_chat(&pool, &bob, "Bob", Some("https://h.test/b")).await;

    let (h, v) = auth_header(&token);
    let res = server
        .get(&format!("/api/chats/{}/messages", bob_chat))
        .add_header(h, v)
        .await;

    res.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_messages_ascending_by_created_at() {
    let (server, pool, uid, token) = setup().await;
    let chat_id = common::create_test_chat(&pool, &uid, "Chat", Some("https://h.test/a")).await;

    for (ts, content) in [
        ("2026-01-02T00:00:00Z", "second"),
        ("2026-01-01T00:00:00Z", "first"),
    ] {
        sqlx::query(
            "INSERT INTO messages (id, chat_id, role, content, created_at) VALUES (?, ?, 'user', ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&chat_id)
        .bind(content)
        .bind(ts)
        .execute(&pool)
        .await
        .unwrap();
    }

    let (h, v) = auth_header(&token);
    let res = server
        .get(&format!("/api/chats/{}/messages", chat_id))
        .add_header(h, v)
        .await;

    res.assert_status_ok();
    let body: serde_json::Value = res.json();
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["content"], "first");
    assert_eq!(items[1]["content"], "second");
}

#[tokio::test]
async fn send_blank_content_writes_nothing() {
    let (server, pool, uid, token) = setup().await;
    let chat_id = common::create_test_chat(&pool, &uid, "Chat", Some("https://h.test/a")).await;

    let (h, v) = auth_header(&token);
    let res = server
        .post(&format!("/api/chats/{}/messages", chat_id))
        .add_header(h, v)
        .json(&json!({"content": "   "}))
        .await;

    res.assert_status(StatusCode::BAD_REQUEST);
    assert!(chat_rows(&pool, &chat_id).await.is_empty());
}

#[tokio::test]
async fn send_without_configured_webhook_is_rejected() {
    let (server, pool, uid, token) = setup().await;
    let chat_id = common::create_test_chat(&pool, &uid, "No hook", None).await;

    let (h, v) = auth_header(&token);
    let res = server
        .post(&format!("/api/chats/{}/messages", chat_id))
        .add_header(h, v)
        .json(&json!({"content": "hello"}))
        .await;

    res.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(chat_rows(&pool, &chat_id).await.is_empty());
}

#[tokio::test]
async fn send_to_unowned_chat_writes_nothing() {
    let (server, pool, _uid, token) = setup().await;
    let (bob, _) = common::create_test_user(&pool, "bob@test.com", "pass12345").await;
    let bob_chat = common::create_test_chat(&pool, &bob, "Bob", Some("https://h.test/b")).await;

    let (h, v) = auth_header(&token);
    let res = server
        .post(&format!("/api/chats/{}/messages", bob_chat))
        .add_header(h, v)
        .json(&json!({"content": "hello"}))
        .await;

    res.assert_status(StatusCode::NOT_FOUND);
    assert!(chat_rows(&pool, &bob_chat).await.is_empty());
}

#[tokio::test]
async fn send_with_object_reply_records_bot_output() {
    let (server, pool, uid, token) = setup().await;
    let webhook = common::start_webhook_stub(StatusCode::OK, json!({"output": "hi"})).await;
    let chat_id = common::create_test_chat(&pool, &uid, "Chat", Some(&webhook)).await;

    let (h, v) = auth_header(&token);
    let res = server
        .post(&format!("/api/chats/{}/messages", chat_id))
        .add_header(h, v)
        .json(&json!({"content": "hello bot"}))
        .await;

    res.assert_status_ok();
    let body: serde_json::Value = res.json();
    assert_eq!(body["userMessage"]["content"], "hello bot");
    assert_eq!(body["botMessage"]["content"], "hi");

    let rows = chat_rows(&pool, &chat_id).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], ("user".into(), Some("hello bot".into())));
    assert_eq!(rows[1], ("bot".into(), Some("hi".into())));
}

#[tokio::test]
async fn send_with_array_reply_takes_first_output() {
    let (server, pool, uid, token) = setup().await;
    let webhook =
        common::start_webhook_stub(StatusCode::OK, json!([{"output": "hi"}, {"output": "no"}]))
            .await;
    let chat_id = common::create_test_chat(&pool, &uid, "Chat", Some(&webhook)).await;

    let (h, v) = auth_header(&token);
    let res = server
        .post(&format!("/api/chats/{}/messages", chat_id))
        .add_header(h, v)
        .json(&json!({"content": "hello bot"}))
        .await;

    res.assert_status_ok();
    let rows = chat_rows(&pool, &chat_id).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], ("bot".into(), Some("hi".into())));
}

#[tokio::test]
async fn failing_webhook_yields_fallback_bot_row() {
    let (server, pool, uid, token) = setup().await;
    let webhook =
        common::start_webhook_stub(StatusCode::INTERNAL_SERVER_ERROR, json!({"oops": true})).await;
    let chat_id = common::create_test_chat(&pool, &uid, "Chat", Some(&webhook)).await;

    let (h, v) = auth_header(&token);
    let res = server
        .post(&format!("/api/chats/{}/messages", chat_id))
        .add_header(h, v)
        .json(&json!({"content": "are you there"}))
        .await;

    // Relay failure is not an error: the send still succeeds
    res.assert_status_ok();

    let rows = chat_rows(&pool, &chat_id).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], ("user".into(), Some("are you there".into())));
    assert_eq!(rows[1], ("bot".into(), Some(REPLY_WEBHOOK_UNAVAILABLE.into())));
}

#[tokio::test]
async fn unreachable_webhook_yields_fallback_bot_row() {
    let (server, pool, uid, token) = setup().await;
    // Nothing listens on this port
    let chat_id =
        common::create_test_chat(&pool, &uid, "Chat", Some("http://127.0.0.1:1/webhook")).await;

    let (h, v) = auth_header(&token);
    let res = server
        .post(&format!("/api/chats/{}/messages", chat_id))
        .add_header(h, v)
        .json(&json!({"content": "hello"}))
        .await;

    res.assert_status_ok();
    let rows = chat_rows(&pool, &chat_id).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], ("bot".into(), Some(REPLY_WEBHOOK_UNAVAILABLE.into())));
}

#[tokio::test]
async fn malformed_reply_shape_yields_cannot_process_row() {
    let (server, pool, uid, token) = setup().await;
    let webhook = common::start_webhook_stub(StatusCode::OK, json!({"reply": "hi"})).await;
    let chat_id = common::create_test_chat(&pool, &uid, "Chat", Some(&webhook)).await;

    let (h, v) = auth_header(&token);
    server
        .post(&format!("/api/chats/{}/messages", chat_id))
        .add_header(h, v)
        .json(&json!({"content": "hello"}))
        .await
        .assert_status_ok();

    let rows = chat_rows(&pool, &chat_id).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], ("bot".into(), Some(REPLY_UNPARSEABLE.into())));
}
