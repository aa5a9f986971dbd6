//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `nexushub.toml` in the working directory. Every field has a
//! default so the file is optional. Environment variables take precedence
//! over file values.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use nexushub_adapter_store_http::HttpStoreConfig;
use nexushub_app::config::{EngineConfig, RetriggerPolicy};
use nexushub_app::roles::RoleBindings;
use nexushub_domain::role::Role;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Device store settings.
    pub store: StoreConfig,
    /// Engine cadences and rule behaviour.
    pub engine: EngineSection,
    /// Keyword override per role, keyed by role name (`rack_relay`, ...).
    pub roles: BTreeMap<String, String>,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Which store backs the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Remote REST store.
    #[default]
    Http,
    /// In-memory catalogue, for demos and local runs.
    Virtual,
}

/// Device store configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// Base URL of the REST store. Required for the http store.
    pub base_url: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

/// `[engine]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub safety_poll_secs: u64,
    pub overview_poll_secs: u64,
    pub timer_tick_ms: u64,
    pub retrigger: RetriggerPolicy,
    pub travel_confirm_minutes: u32,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `nexushub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("nexushub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("NEXUSHUB_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("NEXUSHUB_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("NEXUSHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("NEXUSHUB_STORE") {
            match val.as_str() {
                "http" => self.store.kind = StoreKind::Http,
                "virtual" => self.store.kind = StoreKind::Virtual,
                other => tracing::warn!(kind = other, "ignoring unknown NEXUSHUB_STORE"),
            }
        }
        if let Some(val) = var("NEXUSHUB_STORE_URL") {
            self.store.base_url = Some(val);
        }
        if let Some(val) = var("NEXUSHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        let engine = &self.engine;
        if engine.safety_poll_secs == 0 || engine.overview_poll_secs == 0 || engine.timer_tick_ms == 0
        {
            return Err(ConfigError::Validation(
                "engine cadences must be non-zero".to_string(),
            ));
        }
        if self.store.kind == StoreKind::Http
            && self.store.base_url.as_deref().is_none_or(|url| url.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "store.base_url is required for the http store".to_string(),
            ));
        }
        self.role_bindings()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Defaults with the `[roles]` overrides applied.
    ///
    /// # Errors
    ///
    /// Returns an error if a key does not name a role.
    pub fn role_bindings(&self) -> Result<RoleBindings, ConfigError> {
        self.roles
            .iter()
            .try_fold(RoleBindings::default(), |bindings, (name, keyword)| {
                let role = Role::ALL
                    .into_iter()
                    .find(|role| role.to_string() == *name)
                    .ok_or_else(|| ConfigError::Validation(format!("unknown role `{name}`")))?;
                Ok(bindings.with(role, keyword.as_str()))
            })
    }

    /// Engine settings built from the `[engine]` and `[roles]` sections.
    ///
    /// # Errors
    ///
    /// Returns an error if a role override is invalid.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        Ok(EngineConfig {
            safety_poll: Duration::from_secs(self.engine.safety_poll_secs),
            overview_poll: Duration::from_secs(self.engine.overview_poll_secs),
            timer_tick: Duration::from_millis(self.engine.timer_tick_ms),
            retrigger: self.engine.retrigger,
            travel_confirm_minutes: self.engine.travel_confirm_minutes,
            roles: self.role_bindings()?,
        })
    }

    /// Settings for the REST store client, if one is configured.
    #[must_use]
    pub fn http_store(&self) -> Option<HttpStoreConfig> {
        let base_url = self.store.base_url.as_deref()?;
        Some(HttpStoreConfig {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(self.store.timeout_secs),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            base_url: None,
            timeout_secs: 5,
        }
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        let defaults = EngineConfig::default();
        Self {
            safety_poll_secs: defaults.safety_poll.as_secs(),
            overview_poll_secs: defaults.overview_poll.as_secs(),
            timer_tick_ms: 1000,
            retrigger: defaults.retrigger,
            travel_confirm_minutes: defaults.travel_confirm_minutes,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "nexushubd=info,nexushub=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
