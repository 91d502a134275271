use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::Method;
use tracing::debug;
use tracing::trace;

use super::Connector;
use super::Endpoint;
use super::HttpConnection;
use super::HttpRequest;
use super::HttpResponse;
use super::Verb;
use crate::TransportError;

/// [`Connector`] producing plain-HTTP connections backed by `reqwest`
#[derive(Debug, Clone, Default)]
pub struct ReqwestConnector;

impl Connector for ReqwestConnector {
    fn connect(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> std::result::Result<Arc<dyn HttpConnection>, TransportError> {
        let conn = ReqwestConnection::new(endpoint.clone(), timeout)?;
        Ok(Arc::new(conn))
    }
}

/// Connection to one node.
///
/// `reqwest::Client` keeps its own connection pool; a dedicated connection is
/// simply a separately built client, so long polls never queue behind (or
/// block) regular traffic.
#[derive(Debug, Clone)]
pub struct ReqwestConnection {
    endpoint: Endpoint,
    timeout: Duration,
    base_url: String,
    client: Client,
}

impl ReqwestConnection {
    pub fn new(
        endpoint: Endpoint,
        timeout: Duration,
    ) -> std::result::Result<Self, TransportError> {
        debug!("create_connection, endpoint = {}", endpoint);
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            // Redirects carry leader changes; the pipeline handles them itself.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| TransportError::Connect {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            base_url: base_url(&endpoint),
            endpoint,
            timeout,
            client,
        })
    }

    pub(crate) fn url_for(
        &self,
        uri: &str,
    ) -> String {
        format!("{}{}", self.base_url, uri)
    }
}

pub(crate) fn base_url(endpoint: &Endpoint) -> String {
    if endpoint.host.contains(':') {
        // Bare IPv6 literal
        format!("http://[{}]:{}", endpoint.host, endpoint.port)
    } else {
        format!("http://{}:{}", endpoint.host, endpoint.port)
    }
}

pub(crate) fn method_for(verb: Verb) -> Method {
    match verb {
        Verb::Get => Method::GET,
        Verb::Put => Method::PUT,
        Verb::Post => Method::POST,
        Verb::Delete => Method::DELETE,
    }
}

#[async_trait::async_trait]
impl HttpConnection for ReqwestConnection {
    fn endpoint(&self) -> Endpoint {
        self.endpoint.clone()
    }

    async fn execute(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let url = self.url_for(&request.uri);
        trace!("{} {}", request.verb, url);

        let mut builder = self.client.request(method_for(request.verb), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_ascii_lowercase(), value.to_string());
            }
        }
        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn dedicated(&self) -> Arc<dyn HttpConnection> {
        match ReqwestConnection::new(self.endpoint.clone(), self.timeout) {
            Ok(conn) => Arc::new(conn),
            // Building a second client with identical settings only fails if
            // the first one would have; share the existing pool then.
            Err(_) => Arc::new(self.clone()),
        }
    }
}

impl ReqwestConnection {
    fn classify(
        &self,
        err: reqwest::Error,
    ) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_connect() {
            TransportError::Connect {
                endpoint: self.endpoint.to_string(),
                message: err.to_string(),
            }
        } else if err.is_builder() {
            TransportError::InvalidUrl(err.to_string())
        } else {
            TransportError::Io(err.to_string())
        }
    }
}
