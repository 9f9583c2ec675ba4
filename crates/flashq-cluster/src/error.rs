//! Error types for the partition controller and its metadata store.
//!
//! Per-partition failures are contained by the caller and never abort a
//! batch, while infrastructural failures abort the current pass.

use crate::types::{Epoch, LeaderIsrAndControllerEpoch, PartitionId};
use std::fmt;

/// Main error type for partition lifecycle and metadata-store operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerError {
    /// No node exists at this path in the metadata store.
    TopicNotFound { topic: String },
    /// The topic exists but has no assignment for this partition.
    PartitionNotFound { topic: String, partition: PartitionId },
    /// A transition was requested from a state that does not admit it,
    /// per the legal-transition table.
    IllegalStateTransition {
        topic: String,
        partition: PartitionId,
        from: &'static str,
        to: &'static str,
    },
    /// The transition's preconditions were not met: no live replica, a
    /// stale leader node on create, an epoch mismatch, or a missing
    /// leader node when one was expected.
    StateChangeFailed {
        topic: String,
        partition: PartitionId,
        reason: StateChangeFailure,
    },
    /// A leader selector could not pick a leader because no candidate
    /// replica is live.
    PartitionOffline { topic: String, partition: PartitionId },
    /// I/O, (de)serialization, or session failure talking to the metadata
    /// store.
    MetadataStoreError { context: String, reason: String },
    /// Delivering the batched broker requests failed.
    BatchFlushError { reason: String },
    /// A create was attempted on a path that already has a node.
    NodeAlreadyExists { path: String },
}

/// Specific reasons a state-change attempt can fail, kept distinct so
/// callers and tests can tell them apart.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChangeFailure {
    /// None of the assigned replicas are live.
    NoLiveReplica,
    /// The durable node already existed when this controller tried to
    /// create it (soft controller failover). Carries the value observed
    /// on the conflicting node so the caller is not left guessing.
    NodeAlreadyExists {
        existing: Box<LeaderIsrAndControllerEpoch>,
    },
    /// The leader/ISR node was expected to exist but does not.
    LeaderNodeMissing,
    /// The durable node shows a controller epoch higher than this
    /// controller's own, meaning a fresher controller has taken over.
    StaleController { stored_epoch: Epoch, self_epoch: Epoch },
    /// The election retry loop exhausted its configured iteration cap
    /// without a successful conditional write.
    RetriesExhausted { attempts: u32 },
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::TopicNotFound { topic } => write!(f, "topic '{topic}' not found"),
            ControllerError::PartitionNotFound { topic, partition } => {
                write!(f, "partition {partition} not found for topic '{topic}'")
            }
            ControllerError::IllegalStateTransition {
                topic,
                partition,
                from,
                to,
            } => write!(
                f,
                "illegal transition for {topic}-{partition}: {from} -> {to} is not admitted"
            ),
            ControllerError::StateChangeFailed {
                topic,
                partition,
                reason,
            } => write!(f, "state change failed for {topic}-{partition}: {reason}"),
            ControllerError::PartitionOffline { topic, partition } => {
                write!(f, "partition {topic}-{partition} has no online candidate leader")
            }
            ControllerError::MetadataStoreError { context, reason } => {
                write!(f, "metadata store error in {context}: {reason}")
            }
            ControllerError::BatchFlushError { reason } => {
                write!(f, "broker request batch flush failed: {reason}")
            }
            ControllerError::NodeAlreadyExists { path } => {
                write!(f, "node already exists at '{path}'")
            }
        }
    }
}

impl fmt::Display for StateChangeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateChangeFailure::NoLiveReplica => write!(f, "no assigned replica is alive"),
            StateChangeFailure::NodeAlreadyExists { existing } => write!(
                f,
                "leader/ISR node already exists (leader {}, controller epoch {})",
                existing.leader_and_isr.leader, existing.controller_epoch
            ),
            StateChangeFailure::LeaderNodeMissing => write!(f, "leader/ISR info doesn't exist"),
            StateChangeFailure::StaleController {
                stored_epoch,
                self_epoch,
            } => write!(
                f,
                "stored controller epoch {stored_epoch} exceeds this controller's epoch {self_epoch}"
            ),
            StateChangeFailure::RetriesExhausted { attempts } => {
                write!(f, "election retry loop exhausted after {attempts} attempts")
            }
        }
    }
}

impl std::error::Error for ControllerError {}

impl ControllerError {
    pub fn illegal_transition(
        topic: impl Into<String>,
        partition: PartitionId,
        from: &'static str,
        to: &'static str,
    ) -> Self {
        ControllerError::IllegalStateTransition {
            topic: topic.into(),
            partition,
            from,
            to,
        }
    }

    pub fn state_change_failed(
        topic: impl Into<String>,
        partition: PartitionId,
        reason: StateChangeFailure,
    ) -> Self {
        ControllerError::StateChangeFailed {
            topic: topic.into(),
            partition,
            reason,
        }
    }

    /// Per-partition errors: these never abort the caller's batch loop.
    pub fn is_per_partition(&self) -> bool {
        matches!(
            self,
            ControllerError::IllegalStateTransition { .. }
                | ControllerError::StateChangeFailed { .. }
                | ControllerError::PartitionOffline { .. }
                | ControllerError::TopicNotFound { .. }
                | ControllerError::PartitionNotFound { .. }
        )
    }

    /// Infrastructural errors: these abort the current pass.
    pub fn is_infrastructural(&self) -> bool {
        matches!(
            self,
            ControllerError::MetadataStoreError { .. } | ControllerError::BatchFlushError { .. }
        )
    }

    pub fn from_io_error(e: impl fmt::Display, context: &str) -> Self {
        ControllerError::MetadataStoreError {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }
}
