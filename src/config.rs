//! Client configuration.
//!
//! Layers, lowest priority first: compiled-in defaults, an optional TOML file,
//! then `BITTREX_`-prefixed environment variables (`BITTREX_BASE_URL`,
//! `BITTREX_TIMEOUT_MS`, ...).

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

fn default_base_url() -> String {
    "https://bittrex.com/api/v1.1/public".to_string()
}

fn default_ping_path() -> String {
    "getmarkets".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    concat!("bittrex-md/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Every endpoint path is joined onto this.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path (relative to `base_url`) hit by the connectivity check.
    #[serde(default = "default_ping_path")]
    pub ping_path: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ping_path: default_ping_path(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("ping_path", defaults.ping_path)?
            .set_default("timeout_ms", defaults.timeout_ms as i64)?
            .set_default("user_agent", defaults.user_agent)?;

        if let Some(path) = config_path {
            let path_str = path.to_str().context("config path is not valid UTF-8")?;
            builder = builder.add_source(File::with_name(path_str).required(true));
        }

        builder = builder.add_source(Environment::with_prefix("BITTREX").prefix_separator("_").try_parsing(true));

        let cfg: ClientConfig = builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!("base_url must be an http(s) URL, got `{}`", self.base_url);
        }
        if self.timeout_ms == 0 {
            bail!("timeout_ms must be greater than zero");
        }
        Ok(())
    }
}
