//! Metadata-change listeners.

use crate::controller::PartitionStateMachine;
use crate::paths;
use std::collections::HashSet;
use std::sync::Arc;

/// Subscribes to the topics directory and drives `NonExistent -> New ->
/// Online` for every newly discovered topic's partitions.
///
/// Deleted-topic handling beyond cache eviction is deferred: this
/// listener computes and exposes the deleted-topics set to
/// `on_topics_deleted` but does not itself drive `Offline -> NonExistent`.
pub struct TopicChangeListener {
    controller: Arc<PartitionStateMachine>,
}

impl TopicChangeListener {
    pub fn new(controller: Arc<PartitionStateMachine>) -> Self {
        Self { controller }
    }

    /// Registers this listener with the metadata store.
    pub fn register(self: Arc<Self>) {
        let listener = Arc::clone(&self);
        self.controller.metadata_store().subscribe_child_changes(
            &paths::topics_root(),
            Box::new(move |_path, children| {
                listener.on_child_change(children);
            }),
        );
    }

    /// Handles one delivery of the topics-directory child list.
    pub fn on_child_change(&self, current_children: Vec<String>) {
        if self.controller.is_shutting_down() {
            return;
        }

        let current: HashSet<String> = current_children.into_iter().collect();
        let (new_topics, deleted_topics) = self.controller.apply_topic_change(&current);

        if !new_topics.is_empty() {
            tracing::info!(?new_topics, "new topics discovered");
            self.controller.on_new_topic_creation(&new_topics);
        }
        if !deleted_topics.is_empty() {
            tracing::info!(?deleted_topics, "topics removed from metadata store");
            self.on_topics_deleted(&deleted_topics);
        }
    }

    /// Hook hit when topics drop out of the metadata store's child list.
    /// Driving the corresponding partitions `Offline -> NonExistent` is
    /// explicitly deferred; this is a seam for that future work.
    fn on_topics_deleted(&self, deleted_topics: &HashSet<String>) {
        for topic in deleted_topics {
            tracing::debug!(%topic, "topic deletion observed; partition teardown not yet implemented");
        }
    }
}

/// Subscribed per topic to react to partition-count increases.
/// Currently a no-op under the controller lock.
pub struct PartitionChangeListener {
    topic: String,
}

impl PartitionChangeListener {
    pub fn new(topic: impl Into<String>) -> Self {
        Self { topic: topic.into() }
    }

    pub fn on_child_change(&self, controller: &PartitionStateMachine, _current_children: Vec<String>) {
        if controller.is_shutting_down() {
            return;
        }
        tracing::trace!(topic = %self.topic, "partition-change listener fired; no-op");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_change_listener_stores_topic() {
        let listener = PartitionChangeListener::new("orders");
        assert_eq!(listener.topic, "orders");
    }
}
