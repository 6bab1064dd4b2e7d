use reqwest::Method;
use serde::Serialize;

use crate::models::{Credential, Message, StatusPayload};

use super::{ApiClient, ApiError};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest<'a> {
    recipient_id: &'a str,
    content: &'a str,
}

impl ApiClient {
    /// `POST /messages`. The backend echoes the stored message, including the
    /// room it landed in.
    pub async fn send_message(&self, token: &Credential, recipient_id: &str, content: &str) -> Result<Message, ApiError> {
        self.send(
            self.request(Method::POST, "/messages", Some(token))
                .json(&SendMessageRequest { recipient_id, content })
        ).await
    }

    /// `POST /chatrooms/{chatroom_id}/unlock`
    pub async fn unlock_chatroom(&self, token: &Credential, chatroom_id: &str) -> Result<StatusPayload, ApiError> {
        self.send(
            self.request(Method::POST, &format!("/chatrooms/{chatroom_id}/unlock"), Some(token))
                .json(&serde_json::json!({}))
        ).await
    }

    /// `POST /users/chatrooms/{chatroom_id}/nfc-unlock`. The body is empty: the
    /// tag read on the device is not part of the request.
    pub async fn verify_nfc_and_unlock_chatroom(&self, token: &Credential, chatroom_id: &str) -> Result<StatusPayload, ApiError> {
        self.send(
            self.request(Method::POST, &format!("/users/chatrooms/{chatroom_id}/nfc-unlock"), Some(token))
                .json(&serde_json::json!({}))
        ).await
    }
}
