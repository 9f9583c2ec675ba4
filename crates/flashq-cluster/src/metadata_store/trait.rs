//! The abstract metadata-store interface.
//!
//! The real metadata store client, its transport, retries, and session
//! management, is an out-of-scope collaborator; the core only needs a
//! hierarchical key-value store with versioned nodes and child-change
//! subscriptions. This trait is that interface.

use crate::error::ControllerError;

/// Outcome of a conditional write against a versioned node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalUpdateResult {
    /// The write was accepted; the node's version is now `new_version`.
    Success { new_version: i32 },
    /// The node's current version did not match the expected version; no
    /// write occurred. `current_version` is what was actually observed.
    VersionMismatch { current_version: i32 },
}

/// Callback invoked on child-set changes under a watched path.
///
/// Receives the parent path and the full, current set of child names.
/// At-least-once delivery is sufficient.
pub type ChildChangeListener = Box<dyn Fn(&str, Vec<String>) + Send + Sync>;

/// A hierarchical key-value store with versioned nodes and watches.
///
/// Paths are `/`-separated strings. This crate consumes
/// `/brokers/topics`, `/brokers/topics/<topic>`, and
/// `/brokers/topics/<topic>/partitions/<partition>/state`.
pub trait MetadataStore: Send + Sync {
    /// List the names of the direct children of `path`. Returns an empty
    /// vector if `path` has no children (including if it does not exist).
    fn get_children(&self, path: &str) -> Result<Vec<String>, ControllerError>;

    /// Read the data and version at `path`, or `None` if absent.
    fn read_data(&self, path: &str) -> Result<Option<(Vec<u8>, i32)>, ControllerError>;

    /// Create a node at `path` with the given data at version 0.
    ///
    /// Fails with `ControllerError::NodeAlreadyExists` if a node already
    /// exists at `path`.
    fn create_persistent(&self, path: &str, data: Vec<u8>) -> Result<(), ControllerError>;

    /// Conditionally overwrite the data at `path`.
    ///
    /// Succeeds only if the node's current version equals
    /// `expected_version`; fails with `ControllerError::MetadataStoreError`
    /// if no node exists at `path` at all.
    fn conditional_update(
        &self,
        path: &str,
        data: Vec<u8>,
        expected_version: i32,
    ) -> Result<ConditionalUpdateResult, ControllerError>;

    /// Register `listener` to be invoked whenever the child set of `path`
    /// changes.
    fn subscribe_child_changes(&self, path: &str, listener: ChildChangeListener);
}
