//! Thin client for the LinkApp backend: one method per remote capability,
//! one attempt per call.

mod auth;
mod chat;
mod matching;
mod profile;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{ClientConfig, GetField, models::Credential};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Transport(#[source] reqwest::Error),
    /// The backend answered with a non-success status.
    #[error("{message} ({status})")]
    Status { status: StatusCode, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("not signed in")]
    MissingCredential,
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<ApiClient, ApiError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(ApiError::Transport)?;

        Ok(ApiClient {
            http_client,
            base_url: config.api_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&Credential>) -> RequestBuilder {
        let builder = self.http_client.request(method, format!("{}{path}", self.base_url));
        match token {
            Some(token) => builder.bearer_auth(token.secret()),
            None => builder,
        }
    }

    async fn send_raw(&self, builder: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let request_id = Uuid::now_v7();
        let request = builder
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .build()
            .map_err(ApiError::Transport)?;
        let (method, url) = (request.method().clone(), request.url().path().to_owned());

        debug!(%request_id, %method, %url, "sending request");
        let response = self.http_client
            .execute(request)
            .await
            .map_err(ApiError::Transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(ApiError::Transport)?;
        debug!(%request_id, %status, len = body.len(), "response received");

        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                message: error_message(status, &body),
            });
        }

        Ok(body.to_vec())
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send_raw(builder).await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Like `send`, but an empty or `null` body is `None` rather than an error.
    async fn send_optional<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Option<T>, ApiError> {
        let body = self.send_raw(builder).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(json) = serde_json::from_slice::<Value>(body) {
        if let Ok(message) = json.get_str_field("message").or_else(|_| json.get_str_field("error")) {
            return message;
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if !text.is_empty() {
        return text.to_owned();
    }

    status.canonical_reason().unwrap_or("request failed").to_owned()
}
