//! Test components shared by the unit tests: a scripted in-memory store
//! reachable through the regular transport traits, plus response builders.
mod fake_etcd;

pub(crate) use fake_etcd::*;

use serde_json::Value;
use serde_json::json;

use crate::ClientConfig;
use crate::EtcdClient;
use crate::HttpResponse;

pub(crate) const LEADER_HOST: &str = "10.0.0.1";
pub(crate) const LEADER_PORT: u16 = 4001;

/// Config pointing at the fake leader with a short, well-known retry delay
pub(crate) fn test_config() -> ClientConfig {
    ClientConfig {
        host: LEADER_HOST.to_string(),
        port: LEADER_PORT,
        watch_retry_delay_in_ms: 1000,
        ..ClientConfig::default()
    }
}

pub(crate) async fn client_for(
    etcd: &FakeEtcd,
    config: ClientConfig,
) -> EtcdClient {
    EtcdClient::builder()
        .set_config(config)
        .connector(etcd.connector())
        .build()
        .await
        .expect("fake connector never fails for the initial leader")
}

/// Store response with JSON body and `X-Etcd-Index`
pub(crate) fn etcd_response(
    status: u16,
    etcd_index: i64,
    body: Value,
) -> HttpResponse {
    HttpResponse::new(status, body.to_string()).with_header("X-Etcd-Index", etcd_index.to_string())
}

pub(crate) fn node_response(
    etcd_index: i64,
    node: Value,
) -> HttpResponse {
    etcd_response(200, etcd_index, json!({ "action": "get", "node": node }))
}

pub(crate) fn node_json(
    created_index: i64,
    modified_index: i64,
    key: &str,
    value: &str,
) -> Value {
    json!({
        "createdIndex": created_index,
        "modifiedIndex": modified_index,
        "key": key,
        "value": value,
    })
}

/// Deletion notification: node without `value`
pub(crate) fn tombstone_json(
    created_index: i64,
    modified_index: i64,
    key: &str,
) -> Value {
    json!({
        "createdIndex": created_index,
        "modifiedIndex": modified_index,
        "key": key,
    })
}

pub(crate) fn redirect_to(location: &str) -> HttpResponse {
    HttpResponse::new(307, "").with_header("Location", location)
}
