//! Client configuration.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH`)
//! - Environment variable overrides (`ETCD_CLIENT__` prefix)
//!
//! Every knob that used to be a process-wide flag (timeouts, consistency and
//! quorum toggles, watch back-off) lives here and is handed to the client at
//! construction time.
use std::env;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;


const ENV_PREFIX: &str = "ETCD_CLIENT";

/// Connection and protocol parameters of an [`EtcdClient`](crate::EtcdClient)
///
/// # Sources (later override earlier)
/// 1. Type defaults
/// 2. File named by the `CONFIG_PATH` environment variable
/// 3. Environment variables, e.g. `ETCD_CLIENT__QUORUM=false`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// Host of the first node to contact. Leader redirects may move the
    /// client elsewhere afterwards.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port of the first node to contact
    #[serde(default = "default_port")]
    pub port: u16,

    /// Timeout applied to every connection, including long-poll watches
    /// Default: 10 seconds
    #[serde(default = "default_connection_timeout_in_ms")]
    pub connection_timeout_in_ms: u64,

    /// Delay before re-issuing a failed watch poll
    /// Default: 5 seconds
    #[serde(default = "default_watch_retry_delay_in_ms")]
    pub watch_retry_delay_in_ms: u64,

    /// Add `consistent=true` to every request.
    /// Do not turn this off unless you *know* what you're doing.
    #[serde(default = "default_true")]
    pub consistent: bool,

    /// Add `quorum=true` to every non-watch request.
    /// Do not turn this off unless you *know* what you're doing.
    #[serde(default = "default_true")]
    pub quorum: bool,

    /// Maximum number of leader redirects followed by a single operation
    /// before it fails with `UNAVAILABLE`
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    4001
}
fn default_connection_timeout_in_ms() -> u64 {
    10_000
}
fn default_watch_retry_delay_in_ms() -> u64 {
    5_000
}
fn default_true() -> bool {
    true
}
fn default_max_redirects() -> usize {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connection_timeout_in_ms: default_connection_timeout_in_ms(),
            watch_retry_delay_in_ms: default_watch_retry_delay_in_ms(),
            consistent: true,
            quorum: true,
            max_redirects: default_max_redirects(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Callers should call [`validate()`](Self::validate) once all overrides
    /// are applied.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/etcd.toml");
    /// std::env::set_var("ETCD_CLIENT__PORT", "2379");
    /// let cfg = ClientConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(Self::environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional overrides from a file without validation.
    ///
    /// Merging order: current values, then the file, then the environment.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        if self.host.trim().is_empty() {
            return Err(invalid("host cannot be empty"));
        }
        if self.port == 0 {
            return Err(invalid("port must be greater than 0"));
        }
        if self.connection_timeout_in_ms == 0 {
            return Err(invalid("connection_timeout_in_ms must be greater than 0"));
        }
        if self.watch_retry_delay_in_ms == 0 {
            return Err(invalid("watch_retry_delay_in_ms must be greater than 0"));
        }
        if self.max_redirects == 0 {
            return Err(invalid("max_redirects must be at least 1"));
        }
        Ok(self)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_in_ms)
    }

    pub fn watch_retry_delay(&self) -> Duration {
        Duration::from_millis(self.watch_retry_delay_in_ms)
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .ignore_empty(true)
            .try_parsing(true)
    }
}

fn invalid(message: &str) -> Error {
    Error::Config(ConfigError::Message(message.to_string()))
}
