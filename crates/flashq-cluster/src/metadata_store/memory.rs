//! In-memory, hierarchical-path metadata store.
//!
//! Suitable for development, testing, and single-node deployments where
//! persistence across restarts is not required. A real metadata store
//! client (ZooKeeper or similar) is an out-of-scope collaborator; this is
//! the one concrete implementation the crate ships.

use crate::error::ControllerError;
use crate::metadata_store::r#trait::{ChildChangeListener, ConditionalUpdateResult, MetadataStore};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};

#[derive(Default)]
struct Tree {
    nodes: HashMap<String, (Vec<u8>, i32)>,
    children: HashMap<String, BTreeSet<String>>,
    watchers: HashMap<String, Vec<ChildChangeListener>>,
}

impl Tree {
    fn parent_and_name(path: &str) -> (String, String) {
        match path.rsplit_once('/') {
            Some((parent, name)) if !parent.is_empty() => (parent.to_string(), name.to_string()),
            Some((_, name)) => ("/".to_string(), name.to_string()),
            None => ("/".to_string(), path.to_string()),
        }
    }

    fn notify(&self, path: &str) {
        if let Some(listeners) = self.watchers.get(path) {
            let child_names: Vec<String> = self
                .children
                .get(path)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default();
            for listener in listeners {
                listener(path, child_names.clone());
            }
        }
    }
}

/// In-memory implementation of [`MetadataStore`] backed by a tree of
/// versioned byte-string nodes, guarded by a single read-write lock.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    tree: RwLock<Tree>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn get_children(&self, path: &str) -> Result<Vec<String>, ControllerError> {
        let tree = self.tree.read();
        Ok(tree
            .children
            .get(path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn read_data(&self, path: &str) -> Result<Option<(Vec<u8>, i32)>, ControllerError> {
        let tree = self.tree.read();
        Ok(tree.nodes.get(path).cloned())
    }

    fn create_persistent(&self, path: &str, data: Vec<u8>) -> Result<(), ControllerError> {
        let mut tree = self.tree.write();
        if tree.nodes.contains_key(path) {
            return Err(ControllerError::NodeAlreadyExists {
                path: path.to_string(),
            });
        }
        tree.nodes.insert(path.to_string(), (data, 0));
        tree.children.entry(path.to_string()).or_default();

        let (parent, name) = Tree::parent_and_name(path);
        tree.children.entry(parent.clone()).or_default().insert(name);
        tree.notify(&parent);
        Ok(())
    }

    fn conditional_update(
        &self,
        path: &str,
        data: Vec<u8>,
        expected_version: i32,
    ) -> Result<ConditionalUpdateResult, ControllerError> {
        let mut tree = self.tree.write();
        let Some((_, current_version)) = tree.nodes.get(path).cloned() else {
            return Err(ControllerError::MetadataStoreError {
                context: path.to_string(),
                reason: "no node exists at this path".to_string(),
            });
        };

        if current_version != expected_version {
            return Ok(ConditionalUpdateResult::VersionMismatch { current_version });
        }

        let new_version = current_version + 1;
        tree.nodes.insert(path.to_string(), (data, new_version));
        Ok(ConditionalUpdateResult::Success { new_version })
    }

    fn subscribe_child_changes(&self, path: &str, listener: ChildChangeListener) {
        let mut tree = self.tree.write();
        tree.watchers.entry(path.to_string()).or_default().push(listener);
    }
}
