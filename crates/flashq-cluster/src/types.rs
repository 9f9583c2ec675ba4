//! Core value types for partition lifecycle management.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a broker in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BrokerId(pub u32);

/// Identifier for a partition within a topic, value-compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionId(pub u32);

/// Monotonically increasing controller generation number.
///
/// Every durable write is tagged with the writing controller's epoch; a
/// controller must never act on metadata written at a higher epoch than
/// its own, since that indicates a fresher controller has taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Epoch(pub u64);

/// Identifies a single partition of a single topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: PartitionId,
}

/// Ordered sequence of broker ids hosting a partition's replicas.
///
/// Order is significant: the head is the preferred leader. Length must be
/// at least 1 and values distinct; the constructor enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaAssignment(Vec<BrokerId>);

impl ReplicaAssignment {
    pub fn new(replicas: Vec<BrokerId>) -> Self {
        assert!(!replicas.is_empty(), "replica assignment must be non-empty");
        debug_assert!(
            {
                let mut seen = std::collections::HashSet::new();
                replicas.iter().all(|id| seen.insert(*id))
            },
            "replica assignment must not contain duplicate broker ids"
        );
        Self(replicas)
    }

    pub fn preferred_leader(&self) -> BrokerId {
        self.0[0]
    }

    pub fn replicas(&self) -> &[BrokerId] {
        &self.0
    }

    pub fn contains(&self, broker: BrokerId) -> bool {
        self.0.contains(&broker)
    }

    /// Intersects this assignment with the live-broker set, preserving
    /// assignment order.
    pub fn live_subset(&self, live_broker_ids: &std::collections::HashSet<BrokerId>) -> Vec<BrokerId> {
        self.0
            .iter()
            .copied()
            .filter(|id| live_broker_ids.contains(id))
            .collect()
    }
}

/// A partition's current leader, ISR, and durable-node version.
///
/// Invariants: `leader` is a member of `isr`; `isr` is a subset of the
/// partition's assigned replicas; `version` mirrors the metadata-store
/// node version observed at last read/write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderAndIsr {
    pub leader: BrokerId,
    pub isr: Vec<BrokerId>,
    pub version: i32,
}

impl LeaderAndIsr {
    pub fn new(leader: BrokerId, isr: Vec<BrokerId>, version: i32) -> Self {
        debug_assert!(isr.contains(&leader), "leader must be a member of the ISR");
        Self { leader, isr, version }
    }
}

/// A `LeaderAndIsr` tagged with the controller generation that wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderIsrAndControllerEpoch {
    pub leader_and_isr: LeaderAndIsr,
    pub controller_epoch: Epoch,
}

impl From<u32> for BrokerId {
    fn from(id: u32) -> Self {
        BrokerId(id)
    }
}

impl From<BrokerId> for u32 {
    fn from(id: BrokerId) -> Self {
        id.0
    }
}

impl From<u32> for PartitionId {
    fn from(id: u32) -> Self {
        PartitionId(id)
    }
}

impl From<PartitionId> for u32 {
    fn from(id: PartitionId) -> Self {
        id.0
    }
}

impl PartitionId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u64> for Epoch {
    fn from(epoch: u64) -> Self {
        Epoch(epoch)
    }
}

impl From<Epoch> for u64 {
    fn from(epoch: Epoch) -> Self {
        epoch.0
    }
}

impl Epoch {
    pub fn next(self) -> Epoch {
        Epoch(self.0 + 1)
    }
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: PartitionId) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for BrokerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "broker-{}", self.0)
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch-{}", self.0)
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_id_conversions() {
        let id: BrokerId = 42u32.into();
        assert_eq!(id, BrokerId(42));
        let raw: u32 = id.into();
        assert_eq!(raw, 42);
        assert_eq!(id.to_string(), "broker-42");
    }

    #[test]
    fn test_epoch_ordering_and_next() {
        let e1 = Epoch(1);
        let e2 = Epoch(2);
        assert!(e1 < e2);
        assert_eq!(e1.next(), e2);
    }

    #[test]
    fn test_replica_assignment_preserves_order() {
        let assignment = ReplicaAssignment::new(vec![BrokerId(3), BrokerId(1), BrokerId(2)]);
        assert_eq!(assignment.preferred_leader(), BrokerId(3));
        assert_eq!(assignment.replicas(), &[BrokerId(3), BrokerId(1), BrokerId(2)]);
    }

    #[test]
    fn test_replica_assignment_live_subset_preserves_order() {
        let assignment = ReplicaAssignment::new(vec![BrokerId(3), BrokerId(1), BrokerId(2)]);
        let live: std::collections::HashSet<BrokerId> =
            [BrokerId(1), BrokerId(2)].into_iter().collect();
        assert_eq!(assignment.live_subset(&live), vec![BrokerId(1), BrokerId(2)]);
    }

    #[test]
    #[should_panic(expected = "non-empty")]
    fn test_replica_assignment_rejects_empty() {
        ReplicaAssignment::new(vec![]);
    }

    #[test]
    fn test_topic_partition_display() {
        let tp = TopicPartition::new("orders", PartitionId::new(3));
        assert_eq!(tp.to_string(), "orders-3");
    }

    #[test]
    fn test_serialization_round_trip() {
        let leader_isr = LeaderAndIsr::new(BrokerId(1), vec![BrokerId(1), BrokerId(2)], 4);
        let json = serde_json::to_string(&leader_isr).unwrap();
        let back: LeaderAndIsr = serde_json::from_str(&json).unwrap();
        assert_eq!(leader_isr, back);
    }
}
