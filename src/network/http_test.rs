use std::time::Duration;

use super::*;
use super::http::base_url;
use super::http::method_for;

#[test]
fn test_base_url_for_hostname_and_ipv4() {
    assert_eq!(
        base_url(&Endpoint::new("127.0.0.1", 4001)),
        "http://127.0.0.1:4001"
    );
    assert_eq!(
        base_url(&Endpoint::new("etcd-1", 2379)),
        "http://etcd-1:2379"
    );
}

#[test]
fn test_base_url_brackets_ipv6_literal() {
    assert_eq!(base_url(&Endpoint::new("::1", 4001)), "http://[::1]:4001");
}

#[test]
fn test_method_mapping() {
    assert_eq!(method_for(Verb::Get), reqwest::Method::GET);
    assert_eq!(method_for(Verb::Put), reqwest::Method::PUT);
    assert_eq!(method_for(Verb::Post), reqwest::Method::POST);
    assert_eq!(method_for(Verb::Delete), reqwest::Method::DELETE);
}

#[test]
fn test_connector_builds_connection_for_endpoint() {
    let conn = ReqwestConnector
        .connect(&Endpoint::new("10.0.0.7", 4001), Duration::from_secs(1))
        .unwrap();
    assert_eq!(conn.endpoint(), Endpoint::new("10.0.0.7", 4001));

    let dedicated = conn.dedicated();
    assert_eq!(dedicated.endpoint(), Endpoint::new("10.0.0.7", 4001));
    assert!(!std::sync::Arc::ptr_eq(&conn, &dedicated));
}

#[test]
fn test_url_for_appends_uri() {
    let conn = ReqwestConnection::new(Endpoint::new("localhost", 4001), Duration::from_secs(1))
        .unwrap();
    assert_eq!(
        conn.url_for("/v2/keys/foo?consistent=true"),
        "http://localhost:4001/v2/keys/foo?consistent=true"
    );
}

#[tokio::test]
async fn test_execute_against_closed_port_reports_transport_error() {
    // Port 9 (discard) is essentially never open on test hosts.
    let conn = ReqwestConnection::new(Endpoint::new("127.0.0.1", 9), Duration::from_millis(500))
        .unwrap();
    let result = conn
        .execute(HttpRequest {
            verb: Verb::Get,
            uri: "/v2/keys/foo".to_string(),
            headers: vec![],
            body: None,
        })
        .await;
    assert!(result.is_err());
}

#[test]
fn test_response_header_lookup_is_case_insensitive() {
    let response = HttpResponse::new(200, "{}").with_header("X-Etcd-Index", "42");
    assert_eq!(response.header("x-etcd-index"), Some("42"));
    assert_eq!(response.header("X-ETCD-INDEX"), Some("42"));
    assert_eq!(response.header("location"), None);
}

#[test]
fn test_verb_carries_body() {
    assert!(Verb::Put.carries_body());
    assert!(Verb::Post.carries_body());
    assert!(!Verb::Get.carries_body());
    assert!(!Verb::Delete.carries_body());
}
