//! Typed HTTP client for the hookchat server API.

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::{ClientError, Result};
use crate::model::{Chat, MessageRow, SendReceipt, SessionUser};

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, self.url(path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn handle<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v["error"].as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| status.to_string());

        match status.as_u16() {
            401 => Err(ClientError::Unauthorized),
            404 => Err(ClientError::NotFound),
            code => Err(ClientError::Api {
                status: code,
                message,
            }),
        }
    }

    // ── Session gate ──

    pub async fn sign_up(&mut self, email: &str, password: &str, name: &str) -> Result<SessionUser> {
        let res = self
            .http
            .post(self.url("/api/auth/sign-up/email"))
            .json(&json!({"email": email, "password": password, "name": name}))
            .send()
            .await?;
        let body: serde_json::Value = Self::handle(res).await?;

        self.token = body["token"].as_str().map(|s| s.to_string());
        Ok(serde_json::from_value(body["user"].clone())
            .map_err(|e| ClientError::Api { status: 200, message: e.to_string() })?)
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<SessionUser> {
        let res = self
            .http
            .post(self.url("/api/auth/sign-in/email"))
            .json(&json!({"email": email, "password": password}))
            .send()
            .await?;
        let body: serde_json::Value = Self::handle(res).await?;

        self.token = body["token"].as_str().map(|s| s.to_string());
        Ok(serde_json::from_value(body["user"].clone())
            .map_err(|e| ClientError::Api { status: 200, message: e.to_string() })?)
    }

    /// `None` means no valid session: the caller should route to login.
    pub async fn get_session(&self) -> Result<Option<SessionUser>> {
        let res = self
            .request(reqwest::Method::GET, "/api/auth/get-session")
            .send()
            .await?;
        let body: serde_json::Value = Self::handle(res).await?;

        if body.is_null() {
            return Ok(None);
        }
        Ok(serde_json::from_value(body["user"].clone()).ok())
    }

    pub async fn sign_out(&mut self) -> Result<()> {
        let res = self
            .request(reqwest::Method::POST, "/api/auth/sign-out")
            .send()
            .await?;
        let _: serde_json::Value = Self::handle(res).await?;
        self.token = None;
        Ok(())
    }

    // ── Chat directory ──

    pub async fn list_chats(&self) -> Result<Vec<Chat>> {
        let res = self.request(reqwest::Method::GET, "/api/chats").send().await?;
        Self::handle(res).await
    }

    pub async fn create_chat(&self, title: Option<&str>, webhook_url: &str) -> Result<Chat> {
        if webhook_url.trim().is_empty() {
            return Err(ClientError::Validation("Webhook URL is required".into()));
        }
        let res = self
            .request(reqwest::Method::POST, "/api/chats")
            .json(&json!({"title": title, "webhookUrl": webhook_url}))
            .send()
            .await?;
        Self::handle(res).await
    }

    pub async fn get_chat(&self, chat_id: &str) -> Result<Chat> {
        let res = self
            .request(reqwest::Method::GET, &format!("/api/chats/{}", chat_id))
            .send()
            .await?;
        Self::handle(res).await
    }

    pub async fn update_chat(&self, chat_id: &str, title: &str, webhook_url: &str) -> Result<()> {
        if title.trim().is_empty() || webhook_url.trim().is_empty() {
            return Err(ClientError::Validation(
                "Title and webhook URL are required".into(),
            ));
        }
        let res = self
            .request(reqwest::Method::PATCH, &format!("/api/chats/{}", chat_id))
            .json(&json!({"title": title, "webhookUrl": webhook_url}))
            .send()
            .await?;
        let _: serde_json::Value = Self::handle(res).await?;
        Ok(())
    }

    pub async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        let res = self
            .request(reqwest::Method::DELETE, &format!("/api/chats/{}", chat_id))
            .send()
            .await?;
        let _: serde_json::Value = Self::handle(res).await?;
        Ok(())
    }

    // ── Message channel ──

    pub async fn list_messages(&self, chat_id: &str) -> Result<Vec<MessageRow>> {
        let res = self
            .request(
                reqwest::Method::GET,
                &format!("/api/chats/{}/messages", chat_id),
            )
            .send()
            .await?;
        Self::handle(res).await
    }

    pub async fn send_message(&self, chat_id: &str, content: &str) -> Result<SendReceipt> {
        let res = self
            .request(
                reqwest::Method::POST,
                &format!("/api/chats/{}/messages", chat_id),
            )
            .json(&json!({"content": content}))
            .send()
            .await?;
        Self::handle(res).await
    }

    pub async fn upload_file(
        &self,
        chat_id: &str,
        filename: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<SendReceipt> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .request(
                reqwest::Method::POST,
                &format!("/api/chats/{}/files", chat_id),
            )
            .multipart(form)
            .send()
            .await?;
        Self::handle(res).await
    }
}
