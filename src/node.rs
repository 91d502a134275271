//! Value types for stored keys and observed changes.

use std::fmt;
use std::time::SystemTime;

use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;

/// A snapshot of one stored key at a point in the store's history.
///
/// `created_index == modified_index` right after creation, and
/// `modified_index >= created_index` always holds for nodes produced by the
/// decoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub created_index: i64,
    pub modified_index: i64,
    /// Absolute path, always starting with `/`
    pub key: String,
    pub value: String,
    /// `None` means the key never expires
    pub expires: Option<SystemTime>,
    /// Tombstone marker; never set on nodes coming from a plain read
    pub deleted: bool,
}

impl Node {
    pub fn new(
        created_index: i64,
        modified_index: i64,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            created_index,
            modified_index,
            key: key.into(),
            value: value.into(),
            expires: None,
            deleted: false,
        }
    }

    /// Sentinel for "no such node", returned alongside failures.
    ///
    /// Never equal to a real node: real indices are non-negative.
    pub fn invalid() -> Self {
        Self::new(-1, -1, "", "")
    }

    pub fn is_valid(&self) -> bool {
        !(self.created_index == -1 && self.modified_index == -1 && self.key.is_empty())
    }

    pub fn with_expiry(
        mut self,
        expires: SystemTime,
    ) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn has_expiry(&self) -> bool {
        self.expires.is_some()
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::invalid()
    }
}

impl fmt::Display for Node {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "[{}: '{}' c: {} m: {}",
            self.key, self.value, self.created_index, self.modified_index
        )?;
        if let Some(expires) = self.expires {
            let at: DateTime<Utc> = expires.into();
            write!(
                f,
                " expires: {}",
                at.to_rfc3339_opts(SecondsFormat::Secs, true)
            )?;
        }
        write!(f, " deleted: {}]", self.deleted)
    }
}

/// One observed change to a watched key.
///
/// `exists == false` signals deletion or expiry: the node's value is empty
/// but its key and indices identify the deletion event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchUpdate {
    pub node: Node,
    pub exists: bool,
}

impl WatchUpdate {
    pub fn new(
        node: Node,
        exists: bool,
    ) -> Self {
        Self { node, exists }
    }
}

impl Default for WatchUpdate {
    fn default() -> Self {
        Self::new(Node::invalid(), false)
    }
}
