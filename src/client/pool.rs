use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use tracing::debug;
use tracing::info;

use crate::Connector;
use crate::Endpoint;
use crate::HttpConnection;
use crate::TransportError;

/// Connection currently believed to be the store's leader
#[derive(Clone)]
pub(crate) struct Leader {
    pub(crate) endpoint: Endpoint,
    pub(crate) conn: Arc<dyn HttpConnection>,
}

/// Caches one connection per store node and tracks which one is the leader.
///
/// Connections are created lazily on first use and live as long as the pool.
/// The leader handle is swapped atomically, so readers never observe a torn
/// update and never block writers.
pub struct ConnectionPool {
    connector: Arc<dyn Connector>,
    timeout: Duration,
    conns: DashMap<Endpoint, Arc<dyn HttpConnection>>,
    leader: ArcSwap<Leader>,
}

impl ConnectionPool {
    /// Creates a pool whose initial leader guess is `host:port`
    pub(crate) fn new(
        connector: Arc<dyn Connector>,
        timeout: Duration,
        host: &str,
        port: u16,
    ) -> std::result::Result<Self, TransportError> {
        let endpoint = Endpoint::new(host, port);
        let conn = connector.connect(&endpoint, timeout)?;
        let conns = DashMap::new();
        conns.insert(endpoint.clone(), conn.clone());

        Ok(Self {
            connector,
            timeout,
            conns,
            leader: ArcSwap::from_pointee(Leader { endpoint, conn }),
        })
    }

    /// Returns the cached connection for `host:port`, creating it on first use
    pub fn get_connection(
        &self,
        host: &str,
        port: u16,
    ) -> std::result::Result<Arc<dyn HttpConnection>, TransportError> {
        let endpoint = Endpoint::new(host, port);

        // Fast path: connection already cached
        if let Some(conn) = self.conns.get(&endpoint) {
            return Ok(conn.value().clone());
        }

        // Slow path: entry() holds the shard lock, so concurrent callers for
        // the same endpoint end up sharing one connection.
        let entry = self
            .conns
            .entry(endpoint.clone())
            .or_try_insert_with(|| {
                debug!("Establishing new connection to {}", endpoint);
                self.connector.connect(&endpoint, self.timeout)
            })?;
        Ok(entry.value().clone())
    }

    /// Retrieves the current leader connection
    pub fn get_leader(&self) -> Arc<dyn HttpConnection> {
        self.leader.load().conn.clone()
    }

    pub fn leader_endpoint(&self) -> Endpoint {
        self.leader.load().endpoint.clone()
    }

    /// Points the leader handle at `host:port` and returns its connection
    pub fn update_leader(
        &self,
        host: &str,
        port: u16,
    ) -> std::result::Result<Arc<dyn HttpConnection>, TransportError> {
        let conn = self.get_connection(host, port)?;
        let endpoint = Endpoint::new(host, port);
        info!("etcd leader: {}", endpoint);
        self.leader.store(Arc::new(Leader {
            endpoint,
            conn: conn.clone(),
        }));
        Ok(conn)
    }

    /// Number of endpoints with a cached connection
    pub fn connection_count(&self) -> usize {
        self.conns.len()
    }
}
