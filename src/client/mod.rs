//! Client for the etcd v2 key/value API
//!
//! Provides the components for talking to an etcd cluster:
//! - [`EtcdClient`] - Main entry point: reads, writes, deletes and watches
//! - [`ClientBuilder`] - Configurable client construction
//! - [`ConnectionPool`] - Per-node connections and the current leader
//! - [`WatchHandle`] - Control over a running watch
//!
//! # Basic Usage
//! ```no_run
//! use etcd2_client::EtcdClient;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let client = EtcdClient::builder()
//!         .endpoint("127.0.0.1", 4001)
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     let index = client.create("/jobs/1", "pending").await.unwrap();
//!     let (node, _) = client.get("/jobs/1").await.unwrap();
//!     client.update("/jobs/1", "done", node.modified_index).await.unwrap();
//!
//!     let watch = client.watch("/jobs/", |updates| {
//!         for update in updates {
//!             println!("{} exists={}", update.node, update.exists);
//!         }
//!     });
//!     watch.cancel();
//!     println!("created at {index}");
//! }
//! ```

mod builder;
mod decode;
mod pool;
mod request;
mod watch;

pub use builder::*;
pub use pool::*;
pub use request::GenericResponse;
pub use watch::*;


use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use crate::ClientApiResult;
use crate::ClientConfig;
use crate::Node;
use crate::Verb;
use crate::utils::op_timer::OpTimer;

/// Entry point for interacting with an etcd cluster
///
/// Cheap to clone; clones share connections and the leader handle.
/// Created through the [`builder()`](EtcdClient::builder) method.
///
/// Every operation returns a [`ClientApiResult`]: on failure there is no
/// payload to misread, the error carries the semantic status instead.
#[derive(Clone)]
pub struct EtcdClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) pool: ConnectionPool,
    pub(crate) config: ClientConfig,
    /// Requests sent without consistency guarantees, for rate-limited logging
    pub(crate) unsafe_requests: AtomicU64,
}

fn params<const N: usize>(pairs: [(&str, String); N]) -> BTreeMap<String, String> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

impl EtcdClient {
    /// Create a configured client builder
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_parts(
        pool: ConnectionPool,
        config: ClientConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                pool,
                config,
                unsafe_requests: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Connections and the leader handle shared by every clone of this client
    pub fn pool(&self) -> &ConnectionPool {
        &self.inner.pool
    }

    /// Reads one key
    ///
    /// # Returns
    /// The node and the store index at the time of the read.
    pub async fn get(
        &self,
        key: &str,
    ) -> ClientApiResult<(Node, i64)> {
        let timer = OpTimer::new("get", key);
        let response = self.generic(key, BTreeMap::new(), Verb::Get, false).await;
        timer.finish(decode::decode_get(&response))
    }

    /// Lists the direct children of a directory
    ///
    /// # Errors
    /// - `INVALID_ARGUMENT` if `dir` is a plain key
    pub async fn get_all(
        &self,
        dir: &str,
    ) -> ClientApiResult<(Vec<Node>, i64)> {
        let timer = OpTimer::new("get_all", dir);
        let response = self.generic(dir, BTreeMap::new(), Verb::Get, false).await;
        timer.finish(decode::decode_get_all(&response))
    }

    /// Creates `key`, failing if it already exists
    ///
    /// # Returns
    /// The index of the new node.
    pub async fn create(
        &self,
        key: &str,
        value: &str,
    ) -> ClientApiResult<i64> {
        let timer = OpTimer::new("create", key);
        let params = params([
            ("value", value.to_string()),
            ("prevExist", "false".to_string()),
        ]);
        let response = self.generic(key, params, Verb::Put, false).await;
        timer.finish(decode::decode_create(&response))
    }

    /// Like [`create`](Self::create), but the key expires after `ttl`
    /// (whole seconds)
    pub async fn create_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> ClientApiResult<i64> {
        let timer = OpTimer::new("create_with_ttl", key);
        let params = params([
            ("value", value.to_string()),
            ("prevExist", "false".to_string()),
            ("ttl", ttl.as_secs().to_string()),
        ]);
        let response = self.generic(key, params, Verb::Put, false).await;
        timer.finish(decode::decode_create(&response))
    }

    /// Appends a node with a store-generated, in-order key under `dir`
    ///
    /// # Returns
    /// The generated key and the index of the new node.
    pub async fn create_in_queue(
        &self,
        dir: &str,
        value: &str,
    ) -> ClientApiResult<(String, i64)> {
        let timer = OpTimer::new("create_in_queue", dir);
        let params = params([
            ("value", value.to_string()),
            ("prevExist", "false".to_string()),
        ]);
        let response = self.generic(dir, params, Verb::Post, false).await;
        timer.finish(decode::decode_create_in_queue(&response))
    }

    /// Compare-and-swap: replaces the value only if the key is still at
    /// `previous_index`
    ///
    /// # Returns
    /// The new modified index.
    pub async fn update(
        &self,
        key: &str,
        value: &str,
        previous_index: i64,
    ) -> ClientApiResult<i64> {
        let timer = OpTimer::new("update", key);
        let params = params([
            ("value", value.to_string()),
            ("prevIndex", previous_index.to_string()),
        ]);
        let response = self.generic(key, params, Verb::Put, false).await;
        timer.finish(decode::decode_update(&response))
    }

    pub async fn update_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
        previous_index: i64,
    ) -> ClientApiResult<i64> {
        let timer = OpTimer::new("update_with_ttl", key);
        let params = params([
            ("value", value.to_string()),
            ("prevIndex", previous_index.to_string()),
            ("ttl", ttl.as_secs().to_string()),
        ]);
        let response = self.generic(key, params, Verb::Put, false).await;
        timer.finish(decode::decode_update(&response))
    }

    /// Unconditionally sets `key`, creating it if needed
    pub async fn force_set(
        &self,
        key: &str,
        value: &str,
    ) -> ClientApiResult<i64> {
        let timer = OpTimer::new("force_set", key);
        let params = params([("value", value.to_string())]);
        let response = self.generic(key, params, Verb::Put, false).await;
        timer.finish(decode::decode_update(&response))
    }

    pub async fn force_set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> ClientApiResult<i64> {
        let timer = OpTimer::new("force_set_with_ttl", key);
        let params = params([
            ("value", value.to_string()),
            ("ttl", ttl.as_secs().to_string()),
        ]);
        let response = self.generic(key, params, Verb::Put, false).await;
        timer.finish(decode::decode_update(&response))
    }

    /// Deletes `key` if it is still at `current_index`
    ///
    /// # Returns
    /// The store index after the deletion.
    pub async fn delete(
        &self,
        key: &str,
        current_index: i64,
    ) -> ClientApiResult<i64> {
        let timer = OpTimer::new("delete", key);
        let params = params([("prevIndex", current_index.to_string())]);
        let response = self.generic(key, params, Verb::Delete, false).await;
        timer.finish(decode::decode_delete(&response))
    }
}
