use super::*;

#[test]
fn test_http_status_mapping() {
    assert_eq!(ErrorCode::from_http_status(200), None);
    assert_eq!(ErrorCode::from_http_status(201), None);
    assert_eq!(
        ErrorCode::from_http_status(403),
        Some(ErrorCode::PermissionDenied)
    );
    assert_eq!(ErrorCode::from_http_status(404), Some(ErrorCode::NotFound));
    assert_eq!(
        ErrorCode::from_http_status(412),
        Some(ErrorCode::FailedPrecondition)
    );
    assert_eq!(ErrorCode::from_http_status(500), Some(ErrorCode::Unavailable));
    assert_eq!(ErrorCode::from_http_status(307), Some(ErrorCode::Unknown));
    assert_eq!(ErrorCode::from_http_status(400), Some(ErrorCode::Unknown));
    assert_eq!(ErrorCode::from_http_status(503), Some(ErrorCode::Unknown));
}

#[test]
fn test_client_api_error_display() {
    let err = ClientApiError::failed_precondition("Invalid JSON: Couldn't find 'node'");
    assert_eq!(
        err.to_string(),
        "FAILED_PRECONDITION: Invalid JSON: Couldn't find 'node'"
    );
    assert_eq!(err.code(), ErrorCode::FailedPrecondition);
    assert_eq!(err.message(), "Invalid JSON: Couldn't find 'node'");
}

#[test]
fn test_retryable_classification() {
    assert!(ClientApiError::unavailable("x").is_retryable());
    assert!(ClientApiError::unknown("x").is_retryable());
    assert!(!ClientApiError::failed_precondition("x").is_retryable());
    assert!(!ClientApiError::new(ErrorCode::NotFound, "x").is_retryable());
    assert!(!ClientApiError::cancelled().is_retryable());
}

#[test]
fn test_transport_error_maps_to_unknown() {
    let err: ClientApiError = TransportError::Io("connection reset".into()).into();
    assert_eq!(err.code(), ErrorCode::Unknown);
    assert!(err.message().contains("connection reset"));
}

#[tokio::test]
async fn test_join_error_from_aborted_task_is_cancelled() {
    let handle = tokio::spawn(std::future::pending::<()>());
    handle.abort();
    let join_err = handle.await.unwrap_err();
    let err: ClientApiError = join_err.into();
    assert!(err.is_cancelled());
}
