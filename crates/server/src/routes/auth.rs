use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use argon2::{PasswordHasher, PasswordVerifier};
use hookchat_shared::constants::MIN_PASSWORD_LENGTH;

use crate::error::ApiError;
use crate::middleware::auth::{extract_token, resolve_session, SESSION_COOKIE};
use crate::models::{SessionResponse, SessionUser, SignInRequest, SignUpRequest};
use crate::AppState;

fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age=2592000",
        SESSION_COOKIE, token
    )
}

async fn create_session(db: &sqlx::SqlitePool, user_id: &str) -> Result<String, sqlx::Error> {
    let session_token = uuid::Uuid::new_v4().to_string();
    let session_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let expires_at = (chrono::Utc::now() + chrono::Duration::days(30)).to_rfc3339();

    sqlx::query(
        r#"INSERT INTO "session" (id, userId, token, expiresAt, createdAt, updatedAt)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&session_id)
    .bind(user_id)
    .bind(&session_token)
    .bind(&expires_at)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(session_token)
}

/// POST /api/auth/sign-up/email
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = body.email.trim().to_lowercase();
    let name = body.name.trim().to_string();

    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::Validation("A valid email is required".into()));
    }
    if body.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    // Hash password
    let salt = argon2::password_hash::SaltString::generate(&mut rand::rngs::OsRng);
    let password_hash = argon2::Argon2::default()
        .hash_password(body.password.as_bytes(), &salt)
        .map_err(|_| ApiError::Validation("Failed to hash password".into()))?
        .to_string();

    let user_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    // Uniqueness is enforced by the email constraint, not a prior SELECT;
    // concurrent sign-ups with the same email both reach this insert and
    // the loser gets the conflict.
    let inserted = sqlx::query(
        r#"INSERT INTO "user" (id, name, email, emailVerified, createdAt, updatedAt)
           VALUES (?, ?, ?, 0, ?, ?)"#,
    )
    .bind(&user_id)
    .bind(&name)
    .bind(&email)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await;

    if let Err(e) = inserted {
        if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
            return Ok((
                StatusCode::CONFLICT,
                Json(serde_json::json!({"error": "Email already registered"})),
            )
                .into_response());
        }
        return Err(e.into());
    }

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
    .execute(&state.db)
    .await?;

    let session_token = create_session(&state.db, &user_id).await?;

    let mut headers = HeaderMap::new();
    headers.insert("set-cookie", session_cookie(&session_token).parse().unwrap());

    let body = SessionResponse {
        user: SessionUser {
            id: user_id,
            email,
            name,
            image: None,
        },
        token: Some(session_token),
    };

    Ok((StatusCode::OK, headers, Json(body)).into_response())
}

/// POST /api/auth/sign-in/email
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = body.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, (String, String, String, Option<String>)>(
        r#"SELECT id, email, name, image FROM "user" WHERE email = ?"#,
    )
    .bind(&email)
    .fetch_optional(&state.db)
    .await?;

    let (user_id, user_email, name, image) = user.ok_or(ApiError::Unauthorized)?;

    let stored_hash = sqlx::query_scalar::<_, String>(
        r#"SELECT password FROM "account" WHERE userId = ? AND providerId = 'credential'"#,
    )
    .bind(&user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::Unauthorized)?;

    let parsed_hash =
        argon2::PasswordHash::new(&stored_hash).map_err(|_| ApiError::Unauthorized)?;

    if argon2::Argon2::default()
        .verify_password(body.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(ApiError::Unauthorized);
    }

    let session_token = create_session(&state.db, &user_id).await?;

    let mut headers = HeaderMap::new();
    headers.insert("set-cookie", session_cookie(&session_token).parse().unwrap());

    let body = SessionResponse {
        user: SessionUser {
            id: user_id,
            email: user_email,
            name,
            image,
        },
        token: Some(session_token),
    };

    Ok((StatusCode::OK, headers, Json(body)).into_response())
}

/// POST /api/auth/sign-out
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_token(&headers) {
        sqlx::query(r#"DELETE FROM "session" WHERE token = ?"#)
            .bind(&token)
            .execute(&state.db)
            .await?;
    }

    // Clear cookie
    let cookie = format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );

    let mut resp_headers = HeaderMap::new();
    resp_headers.insert("set-cookie", cookie.parse().unwrap());

    Ok((StatusCode::OK, resp_headers, Json(serde_json::json!({}))).into_response())
}

/// GET /api/auth/get-session
///
/// Returns `null` instead of 401 when no valid session exists, so the
/// client's session gate can branch without special error handling.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = match extract_token(&headers) {
        Some(t) => t,
        None => return Ok(Json(serde_json::json!(null)).into_response()),
    };

    let user = resolve_session(&state, &token).await?;

    match user {
        Some(user) => {
            let (name, image) = sqlx::query_as::<_, (String, Option<String>)>(
                r#"SELECT name, image FROM "user" WHERE id = ?"#,
            )
            .bind(&user.id)
            .fetch_one(&state.db)
            .await?;

            Ok(Json(serde_json::json!({
                "user": {
                    "id": user.id,
                    "email": user.email,
                    "name": name,
                    "image": image,
                }
            }))
            .into_response())
        }
        None => Ok(Json(serde_json::json!(null)).into_response()),
    }
}
