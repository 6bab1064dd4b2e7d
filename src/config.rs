use reqwest::Url;
use serde_json::Value;

use crate::{AppResult, GetField};

pub const API_URL_VAR: &str = "LINKAPP_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Where the backend lives. Nothing else is configurable: every call is a
/// single attempt with the transport's default timeouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
}

impl ClientConfig {
    pub fn new(api_url: &str) -> AppResult<ClientConfig> {
        let url = Url::parse(api_url).map_err(|e| format!("invalid api url {api_url:?}: {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("api url {api_url:?} must be http or https").into());
        }

        Ok(ClientConfig {
            api_url: api_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Reads `LINKAPP_API_URL`, loading `.env` first if one is present.
    pub fn from_env() -> AppResult<ClientConfig> {
        let _ = dotenv::dotenv();
        match dotenv::var(API_URL_VAR) {
            Ok(api_url) => ClientConfig::new(&api_url),
            Err(dotenv::Error::EnvVar(std::env::VarError::NotPresent)) => ClientConfig::new(DEFAULT_API_URL),
            Err(e) => Err(format!("reading {API_URL_VAR}: {e}").into()),
        }
    }

    /// Expects `{ "api": { "url": "..." } }`.
    pub fn from_json(json: &Value) -> AppResult<ClientConfig> {
        ClientConfig::new(&json.get_obj_field("api")?.get_str_field("url")?)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_url: DEFAULT_API_URL.to_owned(),
        }
    }
}
