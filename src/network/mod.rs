//! HTTP transport abstraction.
//!
//! The client only needs a narrow view of HTTP: open a connection to a
//! host:port, issue verb + path + body, get back status, headers and body.
//! [`HttpConnection`] and [`Connector`] capture exactly that, so the request
//! pipeline can be driven by the bundled [`ReqwestConnector`] in production
//! and by scripted fakes in tests.
mod http;

pub use http::*;

#[cfg(test)]
mod http_test;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
#[cfg(test)]
use mockall::automock;

use crate::TransportError;

/// HTTP verbs used by the key/value API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Put,
    Post,
    Delete,
}

impl Verb {
    /// Whether parameters travel in a form-encoded body rather than the query
    pub fn carries_body(&self) -> bool {
        matches!(self, Verb::Put | Verb::Post)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Put => "PUT",
            Verb::Post => "POST",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a store node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One outgoing HTTP call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub verb: Verb,
    /// Path plus optional `?query`
    pub uri: String,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Raw response as delivered by the transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lowercased
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(
        status: u16,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(
        mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup
    pub fn header(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// A connection to one store node.
///
/// Connections are shared by every operation targeting the same endpoint;
/// operations that may block for a long time ask for a
/// [`dedicated`](HttpConnection::dedicated) copy instead.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait HttpConnection: Send + Sync + 'static {
    /// Endpoint this connection talks to
    fn endpoint(&self) -> Endpoint;

    /// Issues one request and waits for its response.
    ///
    /// # Errors
    /// Any [`TransportError`] means no response was received (connect failure,
    /// timeout, broken stream).
    async fn execute(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError>;

    /// Fresh connection to the same endpoint that shares nothing with `self`
    fn dedicated(&self) -> Arc<dyn HttpConnection>;
}

/// Creates connections for endpoints
#[cfg_attr(test, automock)]
pub trait Connector: Send + Sync + 'static {
    /// # Errors
    /// Returns [`TransportError::Connect`] if a connection object cannot be
    /// built for the endpoint.
    fn connect(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> std::result::Result<Arc<dyn HttpConnection>, TransportError>;
}
