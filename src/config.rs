//! Configuration loading.
//!
//! Settings come from an optional TOML file, then environment overrides
//! (`PORT`, `GEMINI_API_KEY`, `GEMINI_MODEL`). The result is validated once
//! at startup and handed to the server; request handlers never read the
//! environment.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:5000"
//!
//! [provider]
//! model = "gemini-2.5-flash"
//! timeout_secs = 60
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

/// Remote model provider settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Usually supplied through `GEMINI_API_KEY` rather than the file.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
            temperature: None,
            max_output_tokens: None,
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

impl ProviderConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Environment overrides, captured as plain values so they can be applied
/// (and tested) without touching the process environment.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    pub port: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT").ok(),
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            model: std::env::var("GEMINI_MODEL").ok(),
        }
    }
}

/// Loads configuration from `path` (if it exists) and the process environment.
pub fn load_config(path: &Path) -> Result<Config> {
    load_config_with(path, &EnvOverrides::from_env())
}

pub fn load_config_with(path: &Path, env: &EnvOverrides) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str::<Config>(&content).with_context(|| "Failed to parse config file")?
    } else {
        Config::default()
    };

    config.apply_env(env)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    fn apply_env(&mut self, env: &EnvOverrides) -> Result<()> {
        if let Some(port) = env.port.as_deref().filter(|p| !p.is_empty()) {
            let port: u16 = port
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", port))?;
            self.server.bind = with_port(&self.server.bind, port)?;
        }
        if let Some(key) = env.api_key.as_ref().filter(|k| !k.is_empty()) {
            self.provider.api_key = Some(key.clone());
        }
        if let Some(model) = env.model.as_ref().filter(|m| !m.is_empty()) {
            self.provider.model = model.clone();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        if self.provider.timeout_secs == 0 {
            bail!("provider.timeout_secs must be > 0");
        }
        if self.provider.model.trim().is_empty() {
            bail!("provider.model must not be empty");
        }
        if self.provider.base_url.trim().is_empty() {
            bail!("provider.base_url must not be empty");
        }
        if let Some(t) = self.provider.temperature {
            if !(0.0..=2.0).contains(&t) {
                bail!("provider.temperature must be in [0.0, 2.0]");
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("server.bind is not a socket address: '{}'", self.server.bind))
    }

    /// Renders the effective configuration as TOML-like text with the API key redacted.
    pub fn redacted_summary(&self) -> String {
        let key = if self.provider.has_api_key() {
            "<set>"
        } else {
            "<missing>"
        };
        format!(
            "[server]\nbind = \"{}\"\n\n[provider]\nmodel = \"{}\"\nbase_url = \"{}\"\ntimeout_secs = {}\napi_key = {}\n",
            self.server.bind,
            self.provider.model,
            self.provider.base_url,
            self.provider.timeout_secs,
            key
        )
    }
}

fn with_port(bind: &str, port: u16) -> Result<String> {
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("server.bind is not a socket address: '{}'", bind))?;
    Ok(SocketAddr::new(addr.ip(), port).to_string())
}
