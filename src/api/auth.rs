use reqwest::Method;
use serde::Serialize;

use crate::models::AuthResponse;

use super::{ApiClient, ApiError};

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// `POST /login`
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.send(
            self.request(Method::POST, "/login", None)
                .json(&LoginRequest { email, password })
        ).await
    }

    /// `POST /register`
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.send(
            self.request(Method::POST, "/register", None)
                .json(&RegisterRequest { username, email, password })
        ).await
    }
}
