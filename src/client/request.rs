//! Request dispatch against the store's leader.
//!
//! A [`Request`] is built once per operation and may be run several times:
//! every leader redirect (HTTP 307 + `location`) re-runs the very same
//! request against the new leader, so the caller only ever sees the final
//! outcome.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use serde_json::Value;
use tracing::debug;
use tracing::warn;

use super::EtcdClient;
use crate::ClientApiError;
use crate::ClientApiResult;
use crate::Endpoint;
use crate::ErrorCode;
use crate::HttpConnection;
use crate::HttpRequest;
use crate::HttpResponse;
use crate::TransportError;
use crate::Verb;
use crate::utils::json::JsonFields;
use crate::utils::net::endpoint_from_location;
use crate::utils::net::escape_and_join_params;
use crate::utils::net::escape_key;

pub(crate) const KEYS_PREFIX: &str = "/v2/keys";
pub(crate) const ETCD_INDEX_HEADER: &str = "X-Etcd-Index";
const LOCATION_HEADER: &str = "location";
const HTTP_TEMPORARY_REDIRECT: u16 = 307;
const UNSAFE_REQUEST_LOG_EVERY: u64 = 100;

/// Decoded outcome of one operation, before typed decoding
#[derive(Debug, Clone)]
pub struct GenericResponse {
    /// Semantic status derived from the HTTP status code
    pub status: ClientApiResult<()>,
    /// Parsed body; `Null` when absent or not JSON
    pub json_body: Value,
    /// Store index at response time, `-1` when unknown
    pub etcd_index: i64,
}

impl GenericResponse {
    /// Response for an operation that never got an answer from the store
    pub(crate) fn failed(err: ClientApiError) -> Self {
        Self {
            status: Err(err),
            json_body: Value::Null,
            etcd_index: -1,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}

/// One key/value API call, owned by the operation that issued it
#[derive(Debug)]
pub(crate) struct Request {
    verb: Verb,
    path: String,
    dedicated: bool,
    params: String,
}

impl Request {
    pub(crate) fn new(
        verb: Verb,
        key: &str,
        dedicated: bool,
        params: &BTreeMap<String, String>,
    ) -> ClientApiResult<Self> {
        if !key.starts_with('/') {
            return Err(ClientApiError::invalid_argument(format!(
                "key must be an absolute path, got {key:?}"
            )));
        }

        Ok(Self {
            verb,
            path: format!("{KEYS_PREFIX}{}", escape_key(key)),
            dedicated,
            params: escape_and_join_params(params),
        })
    }

    /// Translates into the transport's request shape.
    ///
    /// PUT/POST send parameters as a form body, GET/DELETE as the query.
    pub(crate) fn to_http(&self) -> HttpRequest {
        if self.verb.carries_body() {
            HttpRequest {
                verb: self.verb,
                uri: self.path.clone(),
                headers: vec![(
                    "Content-Type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                )],
                body: Some(self.params.clone()),
            }
        } else {
            let uri = if self.params.is_empty() {
                self.path.clone()
            } else {
                format!("{}?{}", self.path, self.params)
            };
            HttpRequest {
                verb: self.verb,
                uri,
                headers: vec![],
                body: None,
            }
        }
    }

    /// Runs the request once on `conn`, or on a private copy of it when the
    /// request must not share a connection with other traffic.
    pub(crate) async fn run(
        &self,
        conn: Arc<dyn HttpConnection>,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let conn = if self.dedicated {
            conn.dedicated()
        } else {
            conn
        };
        debug!("{} {} on {}", self.verb, self.path, conn.endpoint());
        conn.execute(self.to_http()).await
    }
}

/// What to do after one run of a request
#[derive(Debug)]
pub(crate) enum RequestOutcome {
    /// The node we asked is not the leader; retry on this endpoint
    Redirect(Endpoint),
    Done(GenericResponse),
}

/// Interprets the raw transport outcome of one run
pub(crate) fn request_done(
    raw: std::result::Result<HttpResponse, TransportError>
) -> RequestOutcome {
    let response = match raw {
        Ok(response) => response,
        // This can happen in the case of a timeout, or any failure that left
        // us without a response.
        Err(e) => {
            debug!("request got no response: {}", e);
            return RequestOutcome::Done(GenericResponse::failed(ClientApiError::unknown(
                format!("request returned no response: {e}"),
            )));
        }
    };

    if response.status == HTTP_TEMPORARY_REDIRECT {
        if let Some(endpoint) = response.header(LOCATION_HEADER).and_then(endpoint_from_location)
        {
            return RequestOutcome::Redirect(endpoint);
        }
        warn!("redirect without a usable location header");
    }

    let etcd_index = response
        .header(ETCD_INDEX_HEADER)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(-1);
    let json_body: Value = serde_json::from_slice(&response.body).unwrap_or(Value::Null);

    let status = match ErrorCode::from_http_status(response.status) {
        None => Ok(()),
        Some(code) => Err(ClientApiError::new(
            code,
            message_from_body(&json_body, &response),
        )),
    };

    RequestOutcome::Done(GenericResponse {
        status,
        json_body,
        etcd_index,
    })
}

/// Human-readable error: the body's `message` field, else the raw body
fn message_from_body(
    json_body: &Value,
    response: &HttpResponse,
) -> String {
    match json_body.field_str("message") {
        Some(message) => message.to_string(),
        None => String::from_utf8_lossy(&response.body).into_owned(),
    }
}

impl EtcdClient {
    /// Issues an arbitrary key/value API call against the current leader.
    ///
    /// Adds `consistent=true` and `quorum=true` as configured (`quorum` is
    /// never combined with `wait`), follows leader redirects up to
    /// `max_redirects` times, and decodes the final response.
    ///
    /// `dedicated` requests run on a private connection; long polls use it so
    /// they never hold up other operations.
    pub async fn generic(
        &self,
        key: &str,
        params: BTreeMap<String, String>,
        verb: Verb,
        dedicated: bool,
    ) -> GenericResponse {
        let params = self.with_consistency_params(params);
        let request = match Request::new(verb, key, dedicated, &params) {
            Ok(request) => request,
            Err(e) => return GenericResponse::failed(e),
        };
        self.issue(&request).await
    }

    pub(crate) fn with_consistency_params(
        &self,
        mut params: BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let config = &self.inner.config;
        let mut missing = Vec::new();

        if config.consistent {
            params.insert("consistent".to_string(), "true".to_string());
        } else {
            missing.push("'consistent=true'");
        }

        if config.quorum {
            // "wait" and "quorum" are incompatible.
            if !params.contains_key("wait") {
                params.insert("quorum".to_string(), "true".to_string());
            }
        } else {
            missing.push("'quorum=true'");
        }

        if !missing.is_empty() {
            let n = self.inner.unsafe_requests.fetch_add(1, Ordering::Relaxed);
            if n % UNSAFE_REQUEST_LOG_EVERY == 0 {
                warn!(
                    "Sending request without {} ({} so far)",
                    missing.join(" and "),
                    n + 1
                );
            }
        }

        params
    }

    /// Runs `request` on the leader, re-running it on every redirect.
    pub(crate) async fn issue(
        &self,
        request: &Request,
    ) -> GenericResponse {
        let pool = &self.inner.pool;
        let max_redirects = self.inner.config.max_redirects;
        let mut conn = pool.get_leader();
        let mut redirects = 0usize;

        loop {
            match request_done(request.run(conn).await) {
                RequestOutcome::Done(response) => return response,
                RequestOutcome::Redirect(endpoint) => {
                    redirects += 1;
                    if redirects > max_redirects {
                        warn!(
                            "giving up on {} after {} leader redirects",
                            request.path, max_redirects
                        );
                        return GenericResponse::failed(ClientApiError::unavailable(format!(
                            "too many leader redirects (last: {endpoint})"
                        )));
                    }

                    conn = match pool.update_leader(&endpoint.host, endpoint.port) {
                        Ok(conn) => conn,
                        Err(e) => return GenericResponse::failed(e.into()),
                    };
                }
            }
        }
    }
}
