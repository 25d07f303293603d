use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Default config file looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "crud-events.toml";

/// Prefix of environment overrides, e.g. `CRUD_EVENTS__EVENTS__TOPIC=orders`.
pub const ENV_PREFIX: &str = "CRUD_EVENTS";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CrudEventsConfig {
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CrudEventsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.events.validate()?;

        if !self.registry.address.is_empty() {
            Url::parse(&self.registry.address).map_err(|e| {
                ConfigError::Invalid(format!(
                    "registry.address {} is not a URL: {e}",
                    self.registry.address
                ))
            })?;
        }
        if self.registry.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "registry.timeout_secs must be > 0".into(),
            ));
        }
        if self.registry.token_env.is_empty() {
            return Err(ConfigError::Invalid(
                "registry.token_env must not be empty".into(),
            ));
        }

        Url::parse(&self.broker.dapr_url).map_err(|e| {
            ConfigError::Invalid(format!(
                "broker.dapr_url {} is not a URL: {e}",
                self.broker.dapr_url
            ))
        })?;
        if self.broker.timeout_secs == 0 {
            return Err(ConfigError::Invalid("broker.timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}

/// Settings of the emission pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Prefix of every descriptor key looked up by the interceptor.
    #[serde(default)]
    pub application_id: String,
    /// Pub/sub component the events are published to.
    #[serde(default = "default_bus_name")]
    pub bus_name: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Skip emission when the handler returned an error.
    #[serde(default = "default_true")]
    pub handle_only_successful: bool,
    #[serde(default)]
    pub dispatch: DispatchMode,
}

impl EventsConfig {
    pub fn new(
        application_id: impl Into<String>,
        bus_name: impl Into<String>,
        topic: impl Into<String>,
        handle_only_successful: bool,
    ) -> Self {
        Self {
            application_id: application_id.into(),
            bus_name: bus_name.into(),
            topic: topic.into(),
            handle_only_successful,
            dispatch: DispatchMode::Inline,
        }
    }

    #[must_use]
    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "events.application_id must not be empty".into(),
            ));
        }
        if self.bus_name.trim().is_empty() {
            return Err(ConfigError::Invalid("events.bus_name must not be empty".into()));
        }
        if self.topic.trim().is_empty() {
            return Err(ConfigError::Invalid("events.topic must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            application_id: String::new(),
            bus_name: default_bus_name(),
            topic: default_topic(),
            handle_only_successful: true,
            dispatch: DispatchMode::Inline,
        }
    }
}

/// Where the publish step runs relative to the RPC response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Publish before the RPC returns; publish latency is part of RPC latency.
    #[default]
    Inline,
    /// Publish on a spawned task after the RPC result is handed back.
    Background,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the schema registry. Empty disables registration.
    #[serde(default)]
    pub address: String,
    /// Environment variable holding the `Authorization` credential.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Topic on `events.bus_name` where registered schemas are announced.
    #[serde(default)]
    pub schema_topic: Option<String>,
}

impl RegistryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
            schema_topic: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_dapr_url")]
    pub dapr_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Environment variable holding the Dapr sidecar API token, if any.
    #[serde(default = "default_dapr_token_env")]
    pub api_token_env: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            dapr_url: default_dapr_url(),
            timeout_secs: default_timeout_secs(),
            api_token_env: default_dapr_token_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bus_name() -> String {
    "pubsub".to_string()
}
fn default_topic() -> String {
    "crud-events".to_string()
}
fn default_true() -> bool {
    true
}
fn default_token_env() -> String {
    "SECRET_JWT".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_dapr_url() -> String {
    "http://localhost:3500".to_string()
}
fn default_dapr_token_env() -> String {
    "DAPR_API_TOKEN".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Load and validate configuration from an optional TOML file plus
/// environment overrides.
///
/// With no path, `crud-events.toml` in the working directory is used when it
/// exists, and defaults plus environment apply otherwise. An explicit path
/// must exist.
pub fn load_config(path: Option<&Path>) -> Result<CrudEventsConfig, ConfigError> {
    let merged = read_config(path)?;
    merged.validate()?;
    Ok(merged)
}

/// Same sources as [`load_config`], without validation, for callers that
/// apply their own overrides first.
pub fn read_config(path: Option<&Path>) -> Result<CrudEventsConfig, ConfigError> {
    let file = match path {
        Some(explicit) => File::from(explicit),
        None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
    };
    let builder = Config::builder().add_source(file).add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__"),
    );

    let cfg = builder
        .build()
        .map_err(|e| ConfigError::Build(e.to_string()))?;
    cfg.try_deserialize()
        .map_err(|e| ConfigError::Deserialize(e.to_string()))
}
