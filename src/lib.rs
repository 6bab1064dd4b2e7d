pub mod api;
pub mod app;
pub mod appresult;
pub mod config;
pub mod dispatch;
pub mod models;
pub mod nfc;
pub mod store;
pub mod telemetry;

use serde_json::Value;

pub use app::LinkApp;
pub use appresult::{AppError, AppResult};
pub use config::ClientConfig;

pub trait GetField {
    fn get_str_field(&self, field: &str) -> AppResult<String>;
    fn get_obj_field(&self, field: &str) -> AppResult<&Value>;
}

impl GetField for serde_json::Value {
    fn get_str_field(&self, field: &str) -> AppResult<String> {
        Ok(
            self.get(field)
            .ok_or(format!("expected {field} in {self}"))?
            .as_str()
            .ok_or(format!("expected {field} in {self} to be string"))?
            .to_owned()
        )
    }

    fn get_obj_field(&self, field: &str) -> AppResult<&Value> {
        self.get(field)
        .ok_or(format!("expected {field} in {self}").into())
    }
}
