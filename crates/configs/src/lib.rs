//! # configs
//!
//! Startup settings. Loading order, lowest priority first:
//!
//! 1. built-in defaults (`defaults.toml`)
//! 2. `config/storytime.{toml,yaml,json}` if present
//! 3. `STORYTIME__SECTION__KEY` environment variables (after `.env`)

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment, File, FileFormat};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

const ENV_PREFIX: &str = "STORYTIME";
const CONFIG_FILE: &str = "config/storytime";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub log: LogSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub media: MediaSettings,
    pub backend: BackendSettings,
    #[serde(default)]
    pub captcha: CaptchaSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub json: bool,
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// Absent means the in-memory store
    #[serde(default, deserialize_with = "optional_secret")]
    pub url: Option<SecretString>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    #[serde(deserialize_with = "secret")]
    pub jwt_secret: SecretString,
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    pub root: PathBuf,
    pub url_prefix: String,
    pub max_upload_bytes: usize,
}

/// Identifies the hosted backend project to clients.
#[derive(Debug, Deserialize)]
pub struct BackendSettings {
    pub project_id: String,
    #[serde(default, deserialize_with = "optional_secret")]
    pub api_key: Option<SecretString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptchaSettings {
    #[serde(default)]
    pub site_key: Option<String>,
}

/// The subset of settings clients may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub project_id: String,
    pub api_key: Option<String>,
    pub captcha_site_key: Option<String>,
    pub media_url_prefix: String,
    pub max_upload_bytes: usize,
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

fn optional_secret<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SecretString>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()).map(SecretString::from))
}

impl Settings {
    /// Reads `.env`, the optional config file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_sources(None)
    }

    /// Like [`Settings::load`] but skips validation, for tools that only
    /// touch the store.
    pub fn read() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::build(None)
    }

    /// `env` replaces the process environment when given.
    pub fn from_sources(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let settings = Self::build(env)?;
        settings.validate()?;
        Ok(settings)
    }

    fn build(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(include_str!("defaults.toml"), FileFormat::Toml))
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must be set".into()));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".into()));
        }
        if self.auth.session_ttl_secs == 0 {
            return Err(ConfigError::Invalid("auth.session_ttl_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn public(&self) -> PublicConfig {
        PublicConfig {
            project_id: self.backend.project_id.clone(),
            api_key: self
                .backend
                .api_key
                .as_ref()
                .map(|key| key.expose_secret().to_string()),
            captcha_site_key: self.captcha.site_key.clone(),
            media_url_prefix: self.media.url_prefix.clone(),
            max_upload_bytes: self.media.max_upload_bytes,
        }
    }
}
