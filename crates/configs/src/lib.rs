//! # configs
//!
//! Layered application configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `config/local.toml` (optional)
//! 4. environment variables `BADGE__SECTION__KEY`, e.g. `BADGE__LEDGER__BACKEND=redis`
//!
//! `EVENTIVE_API_URL` and `REDIS_URL` are honored when the corresponding
//! keys are not set any other way, so existing deployments keep working.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "BADGE";
pub const DIRECTORY_URL_FALLBACK: &str = "EVENTIVE_API_URL";
pub const REDIS_URL_FALLBACK: &str = "REDIS_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub directory: DirectoryConfig,
    pub ledger: LedgerConfig,
    pub assets: AssetsConfig,
    pub badge: BadgeConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct DirectoryConfig {
    /// Upstream endpoint; may carry an API key.
    pub url: Option<SecretString>,
    pub timeout_secs: u64,
    /// Re-fetch the directory before every resolution.
    pub refresh_on_resolve: bool,
}

impl DirectoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    Memory,
    Redis,
}

#[derive(Debug, Deserialize)]
pub struct LedgerConfig {
    pub backend: LedgerBackend,
    pub redis_url: Option<SecretString>,
    pub key: String,
    pub max_attempts: u32,
}

#[derive(Debug, Deserialize)]
pub struct AssetsConfig {
    pub root: PathBuf,
    pub font_file: String,
}

#[derive(Debug, Deserialize)]
pub struct BadgeConfig {
    pub font_size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    pub format: LogFormat,
}

impl AppConfig {
    /// Loads `.env`, then every source from `./config` and the process
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::load_from(Path::new("config"), std::env::vars())
    }

    /// Loads from an explicit config directory and environment.
    pub fn load_from(
        dir: &Path,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = env.into_iter().collect();

        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("directory.timeout_secs", 15)?
            .set_default("directory.refresh_on_resolve", true)?
            .set_default("ledger.backend", "memory")?
            .set_default("ledger.key", "badge:pickups")?
            .set_default("ledger.max_attempts", 5)?
            .set_default("assets.root", "./public")?
            .set_default("assets.font_file", "BebasNeue-Regular.ttf")?
            .set_default("badge.font_size", 24.0)?
            .set_default("log.format", "json")?
            .add_source(File::from(dir.join("default.toml")).required(false))
            .add_source(File::from(dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env.clone().into_iter().collect())),
            )
            .build()?;

        let mut cfg: AppConfig = settings.try_deserialize()?;

        if cfg.directory.url.is_none() {
            cfg.directory.url = non_empty(&env, DIRECTORY_URL_FALLBACK);
        }
        if cfg.ledger.redis_url.is_none() {
            cfg.ledger.redis_url = non_empty(&env, REDIS_URL_FALLBACK);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.max_attempts == 0 {
            return Err(ConfigError::Invalid("ledger.max_attempts must be at least 1".into()));
        }
        if self.ledger.backend == LedgerBackend::Redis && self.ledger.redis_url.is_none() {
            return Err(ConfigError::Invalid(format!(
                "ledger.backend = redis needs ledger.redis_url or {REDIS_URL_FALLBACK}"
            )));
        }
        if !(self.badge.font_size.is_finite() && self.badge.font_size > 0.0) {
            return Err(ConfigError::Invalid("badge.font_size must be positive".into()));
        }
        Ok(())
    }
}

fn non_empty(env: &HashMap<String, String>, key: &str) -> Option<SecretString> {
    env.get(key)
        .filter(|v| !v.trim().is_empty())
        .map(|v| SecretString::from(v.clone()))
}
