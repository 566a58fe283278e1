//! Forwards a user message to the chat's configured webhook and resolves
//! the bot reply. Delivery is at-most-once: no retries, and any transport
//! or response-shape failure degrades to a canned reply instead of an error.

use serde::Serialize;
use serde_json::Value;

use hookchat_shared::constants::{REPLY_UNPARSEABLE, REPLY_WEBHOOK_UNAVAILABLE};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Envelope<'a> {
    #[serde(rename_all = "camelCase")]
    Text {
        chat_id: &'a str,
        user_id: &'a str,
        content: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    File {
        chat_id: &'a str,
        user_id: &'a str,
        file_url: &'a str,
        file_type: &'a str,
    },
}

/// POST the envelope to the webhook and resolve a reply string. Always
/// returns something to put in the channel.
pub async fn dispatch(http: &reqwest::Client, webhook_url: &str, envelope: &Envelope<'_>) -> String {
    let response = match http.post(webhook_url).json(envelope).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("webhook unreachable: {}", e);
            return REPLY_WEBHOOK_UNAVAILABLE.to_string();
        }
    };

    if !response.status().is_success() {
        tracing::warn!("webhook returned {}", response.status());
        return REPLY_WEBHOOK_UNAVAILABLE.to_string();
    }

    let body: Value = match response.json().await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("webhook response is not JSON: {}", e);
            return REPLY_UNPARSEABLE.to_string();
        }
    };

    parse_reply(&body).unwrap_or_else(|| REPLY_UNPARSEABLE.to_string())
}

/// Accepts either `{"output": "..."}` or a non-empty array whose first
/// element carries `output`. Anything else is unparseable.
pub fn parse_reply(body: &Value) -> Option<String> {
    match body {
        Value::Array(items) => items
            .first()
            .and_then(|v| v.get("output"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        Value::Object(map) => map
            .get("output")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        _ => None,
    }
}
