use axum::Router;
use hookchat_server::{config::Config, routes, AppState};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

use argon2::PasswordHasher;

/// Create an in-memory SQLite pool with schema applied.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();

    hookchat_server::db::apply_schema(&pool).await.unwrap();

    pool
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        database_path: ":memory:".into(),
        upload_dir: "/tmp/hookchat-test-uploads".into(),
        max_upload_bytes: 10_485_760,
        public_base_url: "http://localhost:3001".into(),
        webhook_timeout_secs: 5,
    }
}

/// Build a test Axum app with the given pool.
pub fn create_test_app(pool: SqlitePool) -> Router {
    let state = Arc::new(AppState::new(pool, test_config()));
    routes::build_router(state)
}

/// Create a test user directly in the database. Returns (user_id, session_token).
pub async fn create_test_user(pool: &SqlitePool, email: &str, password: &str) -> (String, String) {
    let user_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO "user" (id, name, email, emailVerified, createdAt, updatedAt)
           VALUES (?, ?, ?, 0, ?, ?)"#,
    )
    .bind(&user_id)
    .bind(email)
    .bind(email)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    let salt = argon2::password_hash::SaltString::generate(&mut rand::rngs::OsRng);
    let password_hash = argon2::Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string();

    let account_id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        r#"INSERT INTO "account" (id, userId, accountId, providerId, password, createdAt, updatedAt)
           VALUES (?, ?, ?, 'credential', ?, ?, ?)"#,
    )
    .bind(&account_id)
    .bind(&user_id)
    .bind(&user_id)
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    let session_token = uuid::Uuid::new_v4().to_string();
    let session_id = uuid::Uuid::new_v4().to_string();
    let expires_at = (chrono::Utc::now() + chrono::Duration::days(30)).to_rfc3339();

    sqlx::query(
        r#"INSERT INTO "session" (id, userId, token, expiresAt, createdAt, updatedAt)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&session_id)
    .bind(&user_id)
    .bind(&session_token)
    .bind(&expires_at)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    (user_id, session_token)
}

/// Insert a chat row directly. `webhook_url: None` models a chat with no
/// relay configured.
pub async fn create_test_chat(
    pool: &SqlitePool,
    user_id: &str,
    title: &str,
    webhook_url: Option<&str>,
) -> String {
    let chat_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("INSERT INTO chats (id, user_id, title, webhook_url, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(&chat_id)
        .bind(user_id)
        .bind(title)
        .bind(webhook_url)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();

    chat_id
}

/// Start a one-route webhook stub on an ephemeral port. Returns its URL.
#[allow(dead_code)]
pub async fn start_webhook_stub(status: axum::http::StatusCode, body: serde_json::Value) -> String {
    use axum::routing::any;

    let app = Router::new().route(
        "/webhook",
        any(move || {
            let body = body.clone();
            async move { (status, axum::Json(body)) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}/webhook", addr.port())
}
