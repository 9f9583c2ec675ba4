//! Cluster manifest data structures.
//!
//! A manifest is a convenience seed format for bootstrapping an
//! [`crate::metadata_store::InMemoryMetadataStore`] with a starting set of
//! brokers, topics, and replica assignments. It is not itself a metadata
//! store implementation; leader/ISR state is established by the
//! controller at startup, never carried in the manifest.

use crate::error::ControllerError;
use crate::metadata_store::MetadataStore;
use crate::paths;
use crate::types::{BrokerId, PartitionId, ReplicaAssignment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerSpec {
    pub id: BrokerId,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionAssignment {
    pub id: PartitionId,
    pub replicas: Vec<BrokerId>,
}

impl PartitionAssignment {
    pub fn replica_assignment(&self) -> ReplicaAssignment {
        ReplicaAssignment::new(self.replicas.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicAssignment {
    pub partitions: Vec<PartitionAssignment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterManifest {
    #[serde(default)]
    pub brokers: Vec<BrokerSpec>,
    #[serde(default)]
    pub topics: HashMap<String, TopicAssignment>,
}

impl ClusterManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_broker(&self, broker_id: BrokerId) -> Result<&BrokerSpec, ControllerError> {
        self.brokers
            .iter()
            .find(|broker| broker.id == broker_id)
            .ok_or_else(|| ControllerError::MetadataStoreError {
                context: "manifest lookup".to_string(),
                reason: format!("broker {broker_id} not found in manifest"),
            })
    }

    pub fn get_topic(&self, topic: &str) -> Result<&TopicAssignment, ControllerError> {
        self.topics.get(topic).ok_or_else(|| ControllerError::TopicNotFound {
            topic: topic.to_string(),
        })
    }

    pub fn get_partition(
        &self,
        topic: &str,
        partition_id: PartitionId,
    ) -> Result<&PartitionAssignment, ControllerError> {
        let topic_assignment = self.get_topic(topic)?;
        topic_assignment
            .partitions
            .iter()
            .find(|partition| partition.id == partition_id)
            .ok_or(ControllerError::PartitionNotFound {
                topic: topic.to_string(),
                partition: partition_id,
            })
    }

    /// Populate an empty metadata store with this manifest's topics and
    /// replica assignments, as a convenience for tests and single-node
    /// bootstraps. Does not create any leader/ISR state; that is the
    /// controller's job at startup.
    pub fn seed_into(&self, store: &dyn MetadataStore) -> Result<(), ControllerError> {
        store.create_persistent(&paths::topics_root(), Vec::new())?;
        for (topic, assignment) in &self.topics {
            let replicas: HashMap<u32, Vec<u32>> = assignment
                .partitions
                .iter()
                .map(|p| (p.id.as_u32(), p.replicas.iter().map(|b| b.0).collect()))
                .collect();
            let data = serde_json::to_vec(&replicas).map_err(|e| {
                ControllerError::from_io_error(e, "manifest seeding: replica assignment encode")
            })?;
            store.create_persistent(&paths::topic_path(topic), data)?;
        }
        Ok(())
    }
}
