use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::AuthUser;
use crate::AppState;

pub const SESSION_COOKIE: &str = "hookchat.session_token";

/// Pull the session token from an `Authorization: Bearer` header or the
/// session cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    let prefix = format!("{}=", SESSION_COOKIE);
    let from_cookie = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .split(';')
        .filter_map(|c| {
            let c = c.trim();
            c.strip_prefix(prefix.as_str()).map(|t| t.to_string())
        })
        .next();

    bearer.or(from_cookie).filter(|t| !t.is_empty())
}

/// Resolve a session token to its user, checking expiry.
pub async fn resolve_session(state: &AppState, token: &str) -> Result<Option<AuthUser>, sqlx::Error> {
    let row = sqlx::query_as::<_, (String, String, String)>(
        r#"SELECT u.id, u.email, s.expiresAt
           FROM "session" s
           JOIN "user" u ON u.id = s.userId
           WHERE s.token = ?"#,
    )
    .bind(token)
    .fetch_optional(&state.db)
    .await?;

    let (user_id, email, expires_at) = match row {
        Some(r) => r,
        None => return Ok(None),
    };

    let now = chrono::Utc::now().to_rfc3339();
    if expires_at < now {
        return Ok(None);
    }

    Ok(Some(AuthUser {
        id: user_id,
        email,
    }))
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers).ok_or(ApiError::Unauthorized)?;

        resolve_session(state, &token)
            .await?
            .ok_or(ApiError::Unauthorized)
    }
}
