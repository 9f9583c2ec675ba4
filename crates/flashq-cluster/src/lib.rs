//! Partition lifecycle controller for a partitioned log broker.
//!
//! Tracks every partition through `NonExistent → New → Online → Offline`
//! (and back), fencing writes by controller epoch, coalescing outgoing
//! broker notifications into one message per broker per pass, and
//! reacting to topic creation observed through a watched metadata store.
//!
//! The metadata store itself, the broker transport, and the cluster's
//! leader-election mechanism that decides which process holds the
//! controller role are out-of-scope collaborators; this crate assumes it
//! is already the controller and is handed a `MetadataStore` to drive.

mod batch;
mod config;
mod context;
mod controller;
mod error;
mod listener;
mod manifest;
mod metadata_store;
mod metrics;
mod paths;
mod selector;
mod state;
mod types;
mod wire;

pub use batch::{BrokerRequestBatch, BrokerSender, LeaderAndIsrEntry, LeaderAndIsrRequest, NoopBrokerSender};
pub use config::ControllerConfig;
pub use context::ControllerContext;
pub use controller::PartitionStateMachine;
pub use error::{ControllerError, StateChangeFailure};
pub use listener::{PartitionChangeListener, TopicChangeListener};
pub use manifest::{BrokerSpec, ClusterManifest, ManifestLoader, PartitionAssignment, TopicAssignment};
pub use metadata_store::{ChildChangeListener, ConditionalUpdateResult, InMemoryMetadataStore, MetadataStore};
pub use metrics::{ControllerMetrics, LoggingMetrics, NoopMetrics};
pub use selector::{OfflinePartitionLeaderSelector, PartitionLeaderSelector};
pub use state::PartitionState;
pub use types::{BrokerId, Epoch, LeaderAndIsr, LeaderIsrAndControllerEpoch, PartitionId, ReplicaAssignment, TopicPartition};

// Re-export logging macros for consistent usage across the crate.
pub use log::{debug, error, info, trace, warn};
