//! Typed decoding of [`GenericResponse`]s.
//!
//! Every decoder is a pure function: failure statuses pass through
//! unchanged, and any response that does not have the shape the operation
//! expects becomes `FAILED_PRECONDITION`. Nothing here panics on bad input.

use std::time::SystemTime;

use chrono::DateTime;
use serde_json::Map;
use serde_json::Value;
use tracing::error;

use super::GenericResponse;
use crate::ClientApiError;
use crate::ClientApiResult;
use crate::ErrorCode;
use crate::Node;
use crate::WatchUpdate;
use crate::utils::json::JsonFields;

type JsonObject = Map<String, Value>;

fn missing(field: &str) -> ClientApiError {
    ClientApiError::failed_precondition(format!("Invalid JSON: Couldn't find '{field}'"))
}

/// Propagates a failure status, else returns the body's `node` object
fn node_object(response: &GenericResponse) -> ClientApiResult<&JsonObject> {
    response.status.clone()?;
    response.json_body.field_object("node").ok_or_else(|| missing("node"))
}

fn required_i64(
    node: &JsonObject,
    field: &str,
) -> ClientApiResult<i64> {
    node.field_i64(field).ok_or_else(|| missing(field))
}

fn required_str<'a>(
    node: &'a JsonObject,
    field: &str,
) -> ClientApiResult<&'a str> {
    node.field_str(field).ok_or_else(|| missing(field))
}

fn parse_expiration(node: &JsonObject) -> ClientApiResult<Option<SystemTime>> {
    let Some(raw) = node.get("expiration") else {
        return Ok(None);
    };
    let at = raw
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .ok_or_else(|| {
            ClientApiError::failed_precondition(format!("Invalid JSON: bad 'expiration' {raw}"))
        })?;
    Ok(Some(at.into()))
}

fn check_indices(
    created_index: i64,
    modified_index: i64,
) -> ClientApiResult<()> {
    if modified_index < created_index {
        return Err(ClientApiError::failed_precondition(format!(
            "Invalid node: modifiedIndex {modified_index} < createdIndex {created_index}"
        )));
    }
    Ok(())
}

/// Decodes a node that must carry a value
pub(crate) fn decode_node(node: &JsonObject) -> ClientApiResult<Node> {
    let created_index = required_i64(node, "createdIndex")?;
    let modified_index = required_i64(node, "modifiedIndex")?;
    let key = required_str(node, "key")?;
    let value = required_str(node, "value")?;
    check_indices(created_index, modified_index)?;

    let mut decoded = Node::new(created_index, modified_index, key, value);
    decoded.expires = parse_expiration(node)?;
    Ok(decoded)
}

/// Decodes the node of a change notification.
///
/// A node without `value` is a deletion or expiry.
pub(crate) fn decode_watch_update(node: &JsonObject) -> ClientApiResult<WatchUpdate> {
    let created_index = required_i64(node, "createdIndex")?;
    let modified_index = required_i64(node, "modifiedIndex")?;
    let key = required_str(node, "key")?;
    check_indices(created_index, modified_index)?;

    let (value, exists) = match node.field_str("value") {
        Some(value) => (value, true),
        None => ("", false),
    };
    let mut decoded = Node::new(created_index, modified_index, key, value);
    decoded.expires = parse_expiration(node)?;
    Ok(WatchUpdate::new(decoded, exists))
}

pub(crate) fn decode_get(response: &GenericResponse) -> ClientApiResult<(Node, i64)> {
    let node = decode_node(node_object(response)?)?;
    Ok((node, response.etcd_index))
}

pub(crate) fn decode_get_all(response: &GenericResponse) -> ClientApiResult<(Vec<Node>, i64)> {
    let dir_node = node_object(response)?;

    match dir_node.field_bool("dir") {
        None => return Err(missing("dir")),
        Some(false) => {
            return Err(ClientApiError::new(
                ErrorCode::InvalidArgument,
                "Not a directory",
            ));
        }
        Some(true) => {}
    }

    // An empty directory comes back without "nodes".
    let Some(children) = dir_node.field_array("nodes") else {
        return Ok((Vec::new(), response.etcd_index));
    };

    let nodes = children
        .iter()
        .enumerate()
        .map(|(i, child)| {
            child
                .as_object()
                .ok_or_else(|| {
                    ClientApiError::failed_precondition(format!(
                        "Invalid JSON: Couldn't get 'nodes' index {i}"
                    ))
                })
                .and_then(decode_node)
        })
        .collect::<ClientApiResult<Vec<_>>>()?;

    Ok((nodes, response.etcd_index))
}

/// Returns the index of a freshly created node
pub(crate) fn decode_create(response: &GenericResponse) -> ClientApiResult<i64> {
    let node = node_object(response)?;
    created_index_of(node)
}

/// Returns the generated key and index of a node appended to a directory
pub(crate) fn decode_create_in_queue(
    response: &GenericResponse
) -> ClientApiResult<(String, i64)> {
    let node = node_object(response)?;
    let index = created_index_of(node)?;
    let key = required_str(node, "key")?;
    Ok((key.to_string(), index))
}

fn created_index_of(node: &JsonObject) -> ClientApiResult<i64> {
    let created_index = required_i64(node, "createdIndex")?;
    let modified_index = required_i64(node, "modifiedIndex")?;

    if created_index != modified_index {
        error!(
            created_index,
            modified_index, "created node has diverging indices"
        );
        return Err(ClientApiError::failed_precondition(format!(
            "Invalid node: createdIndex {created_index} != modifiedIndex {modified_index} on create"
        )));
    }
    Ok(created_index)
}

/// Shared by update and force-set: returns the new `modifiedIndex`
pub(crate) fn decode_update(response: &GenericResponse) -> ClientApiResult<i64> {
    let node = node_object(response)?;
    required_i64(node, "modifiedIndex")
}

pub(crate) fn decode_delete(response: &GenericResponse) -> ClientApiResult<i64> {
    response.status.clone()?;
    Ok(response.etcd_index)
}
