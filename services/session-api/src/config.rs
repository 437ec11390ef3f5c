//! Configuration for the session API
//!
//! Layers, lowest precedence first: built-in defaults, the config file
//! when one is given, then `MBSERVICES_*` environment variables (`MBSERVICES_PORT`,
//! `MBSERVICES_KITE__BASE_URL`, ...).

use config::{Config, ConfigError, Environment, File, Map};
use kite_session::KiteConfig;
use serde::{Deserialize, Serialize};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "MBSERVICES";

/// Default listen port
pub const DEFAULT_PORT: u16 = 3008;

/// Session API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Request timeout in seconds; must exceed two Kite calls
    pub timeout_seconds: u64,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Kite client settings
    pub kite: KiteConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            timeout_seconds: 70,
            max_body_size: 64 * 1024,
            kite: KiteConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from defaults, an optional file and the process
    /// environment
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        Self::build(path, None)
    }

    /// Load with an explicit environment map instead of the process
    /// environment
    pub fn load_with_env(path: Option<&str>, env: Map<String, String>) -> Result<Self, ConfigError> {
        Self::build(path, Some(env))
    }

    fn build(path: Option<&str>, env: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// A login makes two sequential Kite calls, each bounded by
    /// `kite.timeout_seconds`
    fn validate(&self) -> Result<(), ConfigError> {
        let login_worst_case = self.kite.timeout_seconds.saturating_mul(2);
        if self.timeout_seconds <= login_worst_case {
            return Err(ConfigError::Message(format!(
                "timeout_seconds ({}) must exceed twice kite.timeout_seconds ({})",
                self.timeout_seconds, self.kite.timeout_seconds
            )));
        }
        Ok(())
    }

    /// Get server address
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
