use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// Bearer token handed out by login/register. Never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Credential {
        Credential(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,

    // whatever else the backend sends along (preferences, location, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial profile. `None` fields are left alone by a merge and omitted from
/// the `PUT /profile` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
}

impl User {
    /// Shallow merge: every field present in `patch` replaces ours.
    pub fn merge(&mut self, patch: &ProfilePatch) {
        let ProfilePatch { username, email, bio, age, gender, interests } = patch.clone();
        if let Some(username) = username {
            self.username = username;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if bio.is_some() {
            self.bio = bio;
        }
        if age.is_some() {
            self.age = age;
        }
        if gender.is_some() {
            self.gender = gender;
        }
        if let Some(interests) = interests {
            self.interests = interests;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    pub token: Credential,
    pub user: User,
}

/// A proposed match. The backend hands out the pending link here, so `id` is
/// what `respond_to_link` expects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default, alias = "image_url", alias = "profile_pic_url")]
    pub image_url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Candidate {
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.name.is_none()
            && self.age.is_none()
            && self.image_url.is_none()
            && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(default, alias = "chatroom_id")]
    pub chatroom_id: Option<String>,
    #[serde(default, alias = "sender_id")]
    pub sender: String,
    #[serde(default, alias = "content")]
    pub text: String,
    #[serde(default, alias = "created_at", with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chatroom {
    pub id: String,
    #[serde(default, alias = "is_locked")]
    pub is_locked: bool,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, alias = "created_at", with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

/// Body of `POST /users/links/{id}/respond`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LinkResponse {
    #[serde(default)]
    pub chatroom: Option<Chatroom>,
}

/// The generic `{ "message": ... }` acknowledgement. Unlock endpoints may also
/// name the room they acted on.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "chatroom_id")]
    pub chatroom_id: Option<String>,
}
