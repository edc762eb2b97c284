//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Account routing configuration.
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Offline queue configuration.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Remote procedure endpoint configuration.
    pub remote: RemoteConfig,
}

/// What the router does when no child account matches the transaction currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPolicy {
    /// Post against the selected parent account.
    #[default]
    FallbackToParent,
    /// Refuse the submission until a currency sub-account exists.
    RequireCurrencyChild,
}

/// Account routing configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutingConfig {
    /// Behaviour when no currency-matched child exists.
    #[serde(default)]
    pub policy: RoutingPolicy,
}

/// Offline queue configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Root directory for the durable queue.
    #[serde(default = "default_queue_root")]
    pub root: String,
}

fn default_queue_root() -> String {
    "./data/offline".to_string()
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            root: default_queue_root(),
        }
    }
}

/// Remote procedure endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the backend (procedures live under `/rest/v1/rpc/`).
    pub base_url: String,
    /// API key sent with every call.
    #[serde(default)]
    pub api_key: String,
    /// Transport timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("ZAHRA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
