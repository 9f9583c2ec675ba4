//! On-wire encoding for the leader/ISR durable node.
//!
//! A UTF-8 JSON record containing at minimum `leader`, `leader_epoch`,
//! `isr`, `controller_epoch`. Readers tolerate additional fields by
//! virtue of serde's default behavior of ignoring unrecognized keys.

use crate::types::{BrokerId, Epoch, LeaderAndIsr, LeaderIsrAndControllerEpoch, PartitionId, ReplicaAssignment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Decodes the `/brokers/topics/<topic>` node: the replica-assignment
/// map for that topic's partitions.
///
/// This data comes from the metadata store, not from a caller-controlled
/// value, so a malformed entry (an empty replica list for some
/// partition) is reported as an error rather than trusted to satisfy
/// `ReplicaAssignment::new`'s invariant.
pub fn decode_replica_assignments(bytes: &[u8]) -> Result<HashMap<PartitionId, ReplicaAssignment>, String> {
    let raw: HashMap<u32, Vec<u32>> = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    raw.into_iter()
        .map(|(partition, replicas)| {
            if replicas.is_empty() {
                return Err(format!("partition {partition} has an empty replica list"));
            }
            let replicas = replicas.into_iter().map(BrokerId).collect();
            Ok((PartitionId::new(partition), ReplicaAssignment::new(replicas)))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireLeaderIsr {
    pub leader: BrokerId,
    /// Mirrors the metadata-store node version; this implementation does
    /// not track a separate Kafka-style leader-epoch counter.
    pub leader_epoch: i32,
    pub isr: Vec<BrokerId>,
    pub controller_epoch: Epoch,
}

impl WireLeaderIsr {
    pub fn encode(entry: &LeaderIsrAndControllerEpoch) -> Vec<u8> {
        let wire = WireLeaderIsr {
            leader: entry.leader_and_isr.leader,
            leader_epoch: entry.leader_and_isr.version,
            isr: entry.leader_and_isr.isr.clone(),
            controller_epoch: entry.controller_epoch,
        };
        serde_json::to_vec(&wire).expect("LeaderIsrAndControllerEpoch is always serializable")
    }

    pub fn decode(bytes: &[u8], version: i32) -> Result<LeaderIsrAndControllerEpoch, String> {
        let wire: WireLeaderIsr = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        Ok(LeaderIsrAndControllerEpoch {
            leader_and_isr: LeaderAndIsr::new(wire.leader, wire.isr, version),
            controller_epoch: wire.controller_epoch,
        })
    }
}
