use reqwest::Method;
use serde::Serialize;

use crate::models::{Candidate, Credential, LinkResponse, MatchSummary, StatusPayload};

use super::{ApiClient, ApiError};

#[derive(Serialize)]
struct RespondRequest {
    accept: bool,
}

impl ApiClient {
    /// `GET /matches`
    pub async fn get_matches(&self, token: &Credential) -> Result<Vec<MatchSummary>, ApiError> {
        Ok(
            self.send_optional(self.request(Method::GET, "/matches", Some(token)))
                .await?
                .unwrap_or_default()
        )
    }

    /// `POST /users/start-searching`
    pub async fn start_searching(&self, token: &Credential) -> Result<StatusPayload, ApiError> {
        self.send(
            self.request(Method::POST, "/users/start-searching", Some(token))
                .json(&serde_json::json!({}))
        ).await
    }

    /// `POST /users/stop-searching`
    pub async fn stop_searching(&self, token: &Credential) -> Result<StatusPayload, ApiError> {
        self.send(
            self.request(Method::POST, "/users/stop-searching", Some(token))
                .json(&serde_json::json!({}))
        ).await
    }

    /// `GET /users/find-match`. `None` when nobody is available right now.
    pub async fn find_match(&self, token: &Credential) -> Result<Option<Candidate>, ApiError> {
        self.send_optional(self.request(Method::GET, "/users/find-match", Some(token))).await
    }

    /// `POST /users/links/{link_id}/respond`
    pub async fn respond_to_link(&self, token: &Credential, link_id: &str, accept: bool) -> Result<LinkResponse, ApiError> {
        Ok(
            self.send_optional(
                self.request(Method::POST, &format!("/users/links/{link_id}/respond"), Some(token))
                    .json(&RespondRequest { accept })
            )
            .await?
            .unwrap_or_default()
        )
    }
}
