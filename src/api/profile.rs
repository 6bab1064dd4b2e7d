use reqwest::Method;

use crate::models::{Credential, ProfilePatch, User};

use super::{ApiClient, ApiError};

impl ApiClient {
    /// `GET /profile`
    pub async fn get_profile(&self, token: &Credential) -> Result<User, ApiError> {
        self.send(self.request(Method::GET, "/profile", Some(token))).await
    }

    /// `PUT /profile`, returns the user as the backend stored it.
    pub async fn update_profile(&self, token: &Credential, patch: &ProfilePatch) -> Result<User, ApiError> {
        self.send(
            self.request(Method::PUT, "/profile", Some(token))
                .json(patch)
        ).await
    }
}
