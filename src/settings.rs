use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub store_base_url: Url,
    pub store_api_key: String,
    pub tenant_id: String,
    pub auth_token: String,
    pub debug: bool,
    pub enable_swagger: bool,
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // Load from environment variables with APP_ prefix
            .add_source(Environment::with_prefix("APP").separator("_"))
            .set_default("store_base_url", "http://127.0.0.1:54321")?
            .set_default("store_api_key", "anon-key-change-me")?
            .set_default("tenant_id", "default")?
            .set_default("auth_token", "default-token-change-me")?
            .set_default("debug", false)?
            .set_default("enable_swagger", true)?
            .set_default("port", 8080)?
            .build()?;

        config.try_deserialize()
    }
}
