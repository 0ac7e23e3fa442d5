//! Layered configuration for the Cohere snippets.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > config file > defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use cohere_api::ApiClient;
use cohere_types::{ApiError, ConfigError};

/// The default Cohere API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.cohere.com";

pub const ENV_API_KEY: &str = "CO_API_KEY";
pub const ENV_API_URL: &str = "CO_API_URL";
pub const ENV_MODEL: &str = "COHERE_MODEL";
pub const ENV_CLIENT_NAME: &str = "COHERE_CLIENT_NAME";
pub const ENV_CONFIG_DIR: &str = "COHERE_CONFIG_DIR";

/// Resolved configuration for one snippets run.
#[derive(Clone)]
pub struct SnippetConfig {
    pub api_key: String,
    pub base_url: String,
    pub client_name: Option<String>,
    pub timeout: Option<Duration>,
    /// Model override. `None` lets the API pick its default where allowed.
    pub model: Option<String>,
    pub config_dir: PathBuf,
}

impl std::fmt::Debug for SnippetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnippetConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("client_name", &self.client_name)
            .field("timeout", &self.timeout)
            .field("model", &self.model)
            .field("config_dir", &self.config_dir)
            .finish()
    }
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api: ApiSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub client_name: Option<String>,
    pub timeout_secs: Option<u64>,
    pub model: Option<String>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl SnippetConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables (`CO_API_KEY`, `CO_API_URL`, `COHERE_MODEL`,
    ///    `COHERE_CLIENT_NAME`)
    /// 3. Config file (`<config_dir>/config.toml`)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = load_settings_file(&config_dir.join("config.toml"));
        Self::resolve(overrides, settings, config_dir, |key| std::env::var(key).ok())
    }

    /// Apply precedence to already-gathered sources.
    pub fn resolve(
        overrides: CliOverrides,
        settings: SettingsFile,
        config_dir: PathBuf,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        // Resolve API key: CLI > env > config file
        let api_key = overrides
            .api_key
            .or_else(|| env(ENV_API_KEY))
            .or(settings.api.api_key)
            .ok_or_else(|| ConfigError::MissingKey {
                key: format!("api_key (set {ENV_API_KEY} or add it to the [api] table of config.toml)"),
            })?;

        let base_url = overrides
            .base_url
            .or_else(|| env(ENV_API_URL))
            .or(settings.api.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "base_url".into(),
                message: format!("expected an http(s) URL, got '{base_url}'"),
            });
        }

        let model = overrides
            .model
            .or_else(|| env(ENV_MODEL))
            .or(settings.api.model);

        let client_name = env(ENV_CLIENT_NAME).or(settings.api.client_name);

        let timeout = match settings.api.timeout_secs {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    key: "timeout_secs".into(),
                    message: "must be greater than zero".into(),
                });
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(SnippetConfig {
            api_key,
            base_url,
            client_name,
            timeout,
            model,
            config_dir,
        })
    }

    /// Build an [`ApiClient`] from this configuration.
    pub fn client(&self) -> Result<ApiClient, ApiError> {
        let mut client = ApiClient::new(&self.api_key, &self.base_url)?;
        if let Some(name) = &self.client_name {
            client = client.with_client_name(name);
        }
        if let Some(timeout) = self.timeout {
            client = client.with_timeout(timeout);
        }
        Ok(client)
    }
}

/// Get the snippets config directory path (~/.cohere/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cohere")
}

/// Load and parse a TOML settings file, returning defaults on any error.
pub fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}
