//! Broker request batch.
//!
//! Coalesces per-partition leader/ISR updates into one aggregated message
//! per broker, so a transition pass costs O(brokers) outgoing messages
//! rather than O(partitions).

use crate::error::ControllerError;
use crate::metrics::ControllerMetrics;
use crate::types::{BrokerId, Epoch, LeaderAndIsr, PartitionId};
use std::collections::HashMap;

/// One partition's worth of leader/ISR data inside an aggregated request.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderAndIsrEntry {
    pub topic: String,
    pub partition: PartitionId,
    pub leader: BrokerId,
    pub isr: Vec<BrokerId>,
    pub version: i32,
    pub replicas: Vec<BrokerId>,
}

/// The aggregated message sent to a single broker.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderAndIsrRequest {
    pub controller_epoch: Epoch,
    pub partitions: Vec<LeaderAndIsrEntry>,
}

/// Delivers an aggregated request to one broker. The transport itself is
/// an out-of-scope collaborator; implementations report delivery failure
/// through the returned `Result` so the batch flush can surface it.
pub trait BrokerSender: Send + Sync {
    fn send_request(&self, broker: BrokerId, request: LeaderAndIsrRequest) -> Result<(), ControllerError>;
}

/// A sender that drops every request and always reports success, for
/// tests that only care about batch bookkeeping.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBrokerSender;

impl BrokerSender for NoopBrokerSender {
    fn send_request(&self, _broker: BrokerId, _request: LeaderAndIsrRequest) -> Result<(), ControllerError> {
        Ok(())
    }
}

/// Accumulates pending per-broker entries for one transition pass.
pub struct BrokerRequestBatch<'a> {
    pending: HashMap<BrokerId, Vec<LeaderAndIsrEntry>>,
    sender: &'a dyn BrokerSender,
    metrics: &'a dyn ControllerMetrics,
}

impl<'a> BrokerRequestBatch<'a> {
    /// Opens a fresh, empty batch.
    pub fn new(sender: &'a dyn BrokerSender, metrics: &'a dyn ControllerMetrics) -> Self {
        Self {
            pending: HashMap::new(),
            sender,
            metrics,
        }
    }

    /// Appends one partition entry to the pending request for each broker
    /// id in `broker_ids`.
    pub fn add_leader_and_isr_request_for_brokers(
        &mut self,
        broker_ids: &[BrokerId],
        topic: &str,
        partition: PartitionId,
        leader_and_isr: &LeaderAndIsr,
        replicas: Vec<BrokerId>,
    ) {
        let entry = LeaderAndIsrEntry {
            topic: topic.to_string(),
            partition,
            leader: leader_and_isr.leader,
            isr: leader_and_isr.isr.clone(),
            version: leader_and_isr.version,
            replicas,
        };
        for broker in broker_ids {
            self.pending.entry(*broker).or_default().push(entry.clone());
        }
    }

    /// For every broker with pending entries, builds one aggregated
    /// message and dispatches it if the broker is live; non-live brokers
    /// are skipped silently. Closes the batch. The first delivery failure
    /// aborts the flush and is returned as a `BatchFlushError`.
    pub fn send_requests_to_brokers(
        self,
        controller_epoch: Epoch,
        live_brokers: &std::collections::HashSet<BrokerId>,
    ) -> Result<(), ControllerError> {
        for (broker, partitions) in self.pending {
            if !live_brokers.contains(&broker) {
                continue;
            }
            let approx_bytes = partitions.len() * 64;
            let request = LeaderAndIsrRequest {
                controller_epoch,
                partitions,
            };
            self.sender.send_request(broker, request).map_err(|e| ControllerError::BatchFlushError {
                reason: format!("delivery to {broker} failed: {e}"),
            })?;
            self.metrics.record_broker_request(broker, approx_bytes);
        }
        Ok(())
    }
}
