//! Watch engine
//!
//! A watch is one spawned task walking through
//! `Initializing -> Active(polling) <-> Active(delayed retry) -> Terminal`.
//!
//! - Initializing: one `get_all` (directory keys, ending in `/`) or `get`,
//!   delivered as a single batch of `exists == true` updates.
//! - Active: long polls with `waitIndex = highest_index_seen + 1` on a
//!   dedicated connection; every answered change is delivered as a batch of
//!   one. Failed or malformed polls are retried after the configured delay
//!   with the same `waitIndex`.
//!
//! The callback runs inside the watch task and the next poll is only issued
//! after it returns, so batches of one watch never overlap and arrive in the
//! order the store reports them.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use tracing::debug;
use tracing::info;
use tracing::info_span;
use tracing::warn;

use super::EtcdClient;
use super::GenericResponse;
use super::decode::decode_watch_update;
use crate::ClientApiError;
use crate::ClientApiResult;
use crate::Node;
use crate::Verb;
use crate::WatchUpdate;
use crate::utils::json::JsonFields;
use crate::utils::net::key_is_directory;

/// Control over a running watch.
///
/// Dropping the handle does not stop the watch; call
/// [`cancel`](WatchHandle::cancel) (or cancel the token it was started with).
#[derive(Debug)]
pub struct WatchHandle {
    key: String,
    token: CancellationToken,
    task: JoinHandle<ClientApiResult<()>>,
}

impl WatchHandle {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stops the watch. No callback runs after the watch task observes it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the watch to end.
    ///
    /// # Returns
    /// - `CANCELLED` after cancellation
    /// - the initial read's error if the snapshot could not be taken
    pub async fn join(self) -> ClientApiResult<()> {
        self.task.await?
    }
}

/// Per-watch state, owned by the watch task together with the callback
struct WatchState {
    client: EtcdClient,
    key: String,
    token: CancellationToken,
    retry_delay: Duration,
    highest_index_seen: i64,
}

/// Runs `fut` unless `token` fires first
async fn unless_cancelled<T>(
    token: &CancellationToken,
    fut: impl Future<Output = T>,
) -> ClientApiResult<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ClientApiError::cancelled()),
        out = fut => Ok(out),
    }
}

impl WatchState {
    async fn run<F>(
        mut self,
        mut callback: F,
    ) -> ClientApiResult<()>
    where
        F: FnMut(Vec<WatchUpdate>) + Send,
    {
        let result = self.watch(&mut callback).await;
        match &result {
            Err(e) if e.is_cancelled() => info!("watch on {} cancelled", self.key),
            Err(e) => warn!("watch on {} failed: {}", self.key, e),
            Ok(()) => {}
        }
        result
    }

    async fn watch<F>(
        &mut self,
        callback: &mut F,
    ) -> ClientApiResult<()>
    where
        F: FnMut(Vec<WatchUpdate>) + Send,
    {
        let (nodes, index) = unless_cancelled(&self.token, self.initial_read()).await??;
        self.check_cancelled()?;

        self.highest_index_seen = index;
        let updates = nodes.into_iter().map(|node| WatchUpdate::new(node, true)).collect();
        self.deliver(callback, updates)?;

        loop {
            self.check_cancelled()?;
            let response = unless_cancelled(&self.token, self.poll()).await?;
            self.check_cancelled()?;

            self.observe_index(response.etcd_index);
            match Self::update_from(&response) {
                Ok(update) => self.deliver(callback, vec![update])?,
                Err(e) => {
                    warn!(
                        "watch poll on {} failed, retrying in {:?}: {}",
                        self.key, self.retry_delay, e
                    );
                    unless_cancelled(&self.token, tokio::time::sleep(self.retry_delay)).await?;
                }
            }
        }
    }

    async fn initial_read(&self) -> ClientApiResult<(Vec<Node>, i64)> {
        if key_is_directory(&self.key) {
            self.client.get_all(&self.key).await
        } else {
            let (node, index) = self.client.get(&self.key).await?;
            Ok((vec![node], index))
        }
    }

    /// Long poll for the first change after `highest_index_seen`.
    ///
    /// An index with no successor never reaches the store; it comes back as
    /// a failed poll and goes through the retry delay like any other.
    async fn poll(&self) -> GenericResponse {
        let Some(wait_index) = self.highest_index_seen.checked_add(1) else {
            return GenericResponse::failed(ClientApiError::failed_precondition(format!(
                "etcd index {} has no successor to wait for",
                self.highest_index_seen
            )));
        };

        let mut params = BTreeMap::new();
        params.insert("wait".to_string(), "true".to_string());
        params.insert("recursive".to_string(), "true".to_string());
        params.insert("waitIndex".to_string(), wait_index.to_string());
        debug!("watch on {} waiting for index {}", self.key, wait_index);
        self.client.generic(&self.key, params, Verb::Get, true).await
    }

    /// Applies the index a poll reported; `highest_index_seen` never decreases
    fn observe_index(
        &mut self,
        index: i64,
    ) {
        if index >= self.highest_index_seen {
            self.highest_index_seen = index;
        } else if index >= 0 {
            warn!(
                "etcd index went backwards on {}: {} < {}",
                self.key, index, self.highest_index_seen
            );
        }
    }

    fn update_from(response: &GenericResponse) -> ClientApiResult<WatchUpdate> {
        response.status.clone()?;
        let node = response.json_body.field_object("node").ok_or_else(|| {
            ClientApiError::failed_precondition("Invalid JSON: Couldn't find 'node'")
        })?;
        decode_watch_update(node)
    }

    fn check_cancelled(&self) -> ClientApiResult<()> {
        if self.token.is_cancelled() {
            return Err(ClientApiError::cancelled());
        }
        Ok(())
    }

    fn deliver<F>(
        &self,
        callback: &mut F,
        updates: Vec<WatchUpdate>,
    ) -> ClientApiResult<()>
    where
        F: FnMut(Vec<WatchUpdate>),
    {
        self.check_cancelled()?;
        callback(updates);
        Ok(())
    }
}

impl EtcdClient {
    /// Watches `key` (or, if it ends in `/`, the subtree below it) until
    /// cancelled.
    ///
    /// `callback` first receives the current state as one batch, then one
    /// batch per change, strictly in order and never concurrently. Transient
    /// poll failures are retried after the configured watch retry delay and
    /// are not reported.
    ///
    /// Must be called from within a tokio runtime.
    pub fn watch<F>(
        &self,
        key: &str,
        callback: F,
    ) -> WatchHandle
    where
        F: FnMut(Vec<WatchUpdate>) + Send + 'static,
    {
        self.watch_with_cancellation(key, callback, &CancellationToken::new())
    }

    /// Like [`watch`](Self::watch), but also stops when `parent` is cancelled
    pub fn watch_with_cancellation<F>(
        &self,
        key: &str,
        callback: F,
        parent: &CancellationToken,
    ) -> WatchHandle
    where
        F: FnMut(Vec<WatchUpdate>) + Send + 'static,
    {
        let token = parent.child_token();
        let state = WatchState {
            client: self.clone(),
            key: key.to_string(),
            token: token.clone(),
            retry_delay: self.inner.config.watch_retry_delay(),
            highest_index_seen: -1,
        };
        info!("starting watch on {}", key);
        let task = tokio::spawn(state.run(callback).instrument(info_span!("watch", key)));

        WatchHandle {
            key: key.to_string(),
            token,
            task,
        }
    }
}
