use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::EtcdClient;
use crate::ClientConfig;
use crate::ConnectionPool;
use crate::Connector;
use crate::ReqwestConnector;
use crate::Result;

/// Configurable builder for [`EtcdClient`] instances
///
/// # Typical Usage Flow
/// 1. Create with `ClientBuilder::new()` (or [`EtcdClient::builder`])
/// 2. Chain configuration methods
/// 3. Finalize with `.build()`
///
/// # Default Configuration
/// - Initial leader: 127.0.0.1:4001
/// - Connection timeout: 10s
/// - Watch retry delay: 5s
/// - `consistent` and `quorum` reads enabled
pub struct ClientBuilder {
    config: ClientConfig,
    connector: Option<Arc<dyn Connector>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Create a new builder with default config
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            connector: None,
        }
    }

    /// Initial guess of the leader's address; redirects correct it later
    pub fn endpoint(
        mut self,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        self.config.host = host.into();
        self.config.port = port;
        self
    }

    /// Set connection timeout (default: 10s)
    pub fn connection_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.config.connection_timeout_in_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the pause between failed watch polls (default: 5s)
    pub fn watch_retry_delay(
        mut self,
        delay: Duration,
    ) -> Self {
        self.config.watch_retry_delay_in_ms = delay.as_millis() as u64;
        self
    }

    pub fn consistent(
        mut self,
        enable: bool,
    ) -> Self {
        self.config.consistent = enable;
        self
    }

    pub fn quorum(
        mut self,
        enable: bool,
    ) -> Self {
        self.config.quorum = enable;
        self
    }

    /// Upper bound on leader redirects followed by a single operation
    pub fn max_redirects(
        mut self,
        max: usize,
    ) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Completely replaces the default configuration
    ///
    /// # Warning: Configuration Override
    /// This will discard all previous settings configured through individual
    /// methods like [`endpoint`](ClientBuilder::endpoint) or
    /// [`connection_timeout`](ClientBuilder::connection_timeout).
    ///
    /// # Example: Full Configuration
    /// ```no_run
    /// use etcd2_client::ClientBuilder;
    /// use etcd2_client::ClientConfig;
    ///
    /// let custom_config = ClientConfig {
    ///     host: "etcd-1".to_string(),
    ///     port: 2379,
    ///     ..ClientConfig::default()
    /// };
    ///
    /// let builder = ClientBuilder::new().set_config(custom_config);
    /// ```
    pub fn set_config(
        mut self,
        config: ClientConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Use a custom transport instead of the bundled reqwest one
    pub fn connector(
        mut self,
        connector: Arc<dyn Connector>,
    ) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Build the client with current configuration
    ///
    /// # Errors
    /// - [`Error::Config`](crate::Error::Config) if the configuration is invalid
    /// - [`Error::Transport`](crate::Error::Transport) if no connection object
    ///   can be created for the initial leader
    pub async fn build(self) -> Result<EtcdClient> {
        let config = self.config.validate()?;
        let connector = self.connector.unwrap_or_else(|| Arc::new(ReqwestConnector));
        debug!("building etcd client for {}:{}", config.host, config.port);

        let pool = ConnectionPool::new(
            connector,
            config.connection_timeout(),
            &config.host,
            config.port,
        )?;
        Ok(EtcdClient::from_parts(pool, config))
    }
}
