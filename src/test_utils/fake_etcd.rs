use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;

use crate::Connector;
use crate::Endpoint;
use crate::HttpConnection;
use crate::HttpRequest;
use crate::HttpResponse;
use crate::TransportError;

/// What one node answers to its next request
#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Respond(HttpResponse),
    Fail(TransportError),
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub endpoint: Endpoint,
    pub dedicated: bool,
    pub request: HttpRequest,
}

#[derive(Default)]
struct FakeState {
    scripts: HashMap<Endpoint, VecDeque<Scripted>>,
    requests: Vec<RecordedRequest>,
    connects: Vec<Endpoint>,
    refused: HashSet<Endpoint>,
}

/// In-memory multi-node store driven by per-endpoint response queues.
///
/// Each request pops the next scripted answer of the node it was sent to.
/// A node with nothing scripted never answers, which is how a long poll
/// without changes looks from the client's side.
#[derive(Clone, Default)]
pub(crate) struct FakeEtcd {
    state: Arc<Mutex<FakeState>>,
    requested: Arc<Notify>,
}

impl FakeEtcd {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn connector(&self) -> Arc<dyn Connector> {
        Arc::new(FakeConnector { etcd: self.clone() })
    }

    pub(crate) fn respond(
        &self,
        host: &str,
        port: u16,
        response: HttpResponse,
    ) {
        self.script(host, port, Scripted::Respond(response));
    }

    pub(crate) fn fail(
        &self,
        host: &str,
        port: u16,
        err: TransportError,
    ) {
        self.script(host, port, Scripted::Fail(err));
    }

    fn script(
        &self,
        host: &str,
        port: u16,
        answer: Scripted,
    ) {
        let mut state = self.state.lock().unwrap();
        state.scripts.entry(Endpoint::new(host, port)).or_default().push_back(answer);
    }

    /// Makes connection attempts to `host:port` fail
    pub(crate) fn refuse(
        &self,
        host: &str,
        port: u16,
    ) {
        self.state.lock().unwrap().refused.insert(Endpoint::new(host, port));
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub(crate) fn connects(&self) -> Vec<Endpoint> {
        self.state.lock().unwrap().connects.clone()
    }

    /// Resolves once at least `n` requests reached the store
    pub(crate) async fn wait_for_requests(
        &self,
        n: usize,
    ) {
        loop {
            let notified = self.requested.notified();
            if self.request_count() >= n {
                return;
            }
            notified.await;
        }
    }

    fn next_answer(
        &self,
        endpoint: &Endpoint,
        dedicated: bool,
        request: HttpRequest,
    ) -> Option<Scripted> {
        let answer = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(RecordedRequest {
                endpoint: endpoint.clone(),
                dedicated,
                request,
            });
            state.scripts.get_mut(endpoint).and_then(VecDeque::pop_front)
        };
        self.requested.notify_waiters();
        answer
    }
}

struct FakeConnector {
    etcd: FakeEtcd,
}

impl Connector for FakeConnector {
    fn connect(
        &self,
        endpoint: &Endpoint,
        _timeout: Duration,
    ) -> Result<Arc<dyn HttpConnection>, TransportError> {
        let mut state = self.etcd.state.lock().unwrap();
        state.connects.push(endpoint.clone());
        if state.refused.contains(endpoint) {
            return Err(TransportError::Connect {
                endpoint: endpoint.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(Arc::new(FakeConnection {
            endpoint: endpoint.clone(),
            dedicated: false,
            etcd: self.etcd.clone(),
        }))
    }
}

struct FakeConnection {
    endpoint: Endpoint,
    dedicated: bool,
    etcd: FakeEtcd,
}

#[async_trait::async_trait]
impl HttpConnection for FakeConnection {
    fn endpoint(&self) -> Endpoint {
        self.endpoint.clone()
    }

    async fn execute(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        match self.etcd.next_answer(&self.endpoint, self.dedicated, request) {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(err)) => Err(err),
            None => std::future::pending().await,
        }
    }

    fn dedicated(&self) -> Arc<dyn HttpConnection> {
        Arc::new(FakeConnection {
            endpoint: self.endpoint.clone(),
            dedicated: true,
            etcd: self.etcd.clone(),
        })
    }
}
