//! Pluggable leader-selection policies.
//!
//! Reassignment, preferred-leader, and controlled-shutdown selectors plug
//! into the same interface but are a separate subsystem, out of scope
//! here; only the offline selector is provided.

use crate::error::ControllerError;
use crate::types::{BrokerId, LeaderAndIsr, PartitionId};
use std::collections::HashSet;

/// Given a partition's current leader/ISR and the live-broker set,
/// computes the next leader/ISR and the set of replicas to notify.
pub trait PartitionLeaderSelector: Send + Sync {
    fn select_leader(
        &self,
        topic: &str,
        partition: PartitionId,
        current: &LeaderAndIsr,
        live_broker_ids: &HashSet<BrokerId>,
    ) -> Result<(LeaderAndIsr, Vec<BrokerId>), ControllerError>;
}

/// Prefers the live members of the current ISR, in ISR order; falls back
/// to any live assigned replica; fails if none are live.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflinePartitionLeaderSelector;

impl PartitionLeaderSelector for OfflinePartitionLeaderSelector {
    fn select_leader(
        &self,
        topic: &str,
        partition: PartitionId,
        current: &LeaderAndIsr,
        live_broker_ids: &HashSet<BrokerId>,
    ) -> Result<(LeaderAndIsr, Vec<BrokerId>), ControllerError> {
        let live_isr: Vec<BrokerId> = current
            .isr
            .iter()
            .copied()
            .filter(|id| live_broker_ids.contains(id))
            .collect();

        let Some(&leader) = live_isr.first() else {
            return Err(ControllerError::PartitionOffline {
                topic: topic.to_string(),
                partition,
            });
        };

        let new_leader_and_isr = LeaderAndIsr::new(leader, live_isr.clone(), current.version);
        Ok((new_leader_and_isr, live_isr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid() -> PartitionId {
        PartitionId::new(0)
    }

    #[test]
    fn test_prefers_first_live_isr_member() {
        let current = LeaderAndIsr::new(BrokerId(1), vec![BrokerId(1), BrokerId(2), BrokerId(3)], 0);
        let live: HashSet<BrokerId> = [BrokerId(2), BrokerId(3)].into_iter().collect();
        let (new_lai, notify) = OfflinePartitionLeaderSelector
            .select_leader("orders", pid(), &current, &live)
            .unwrap();
        assert_eq!(new_lai.leader, BrokerId(2));
        assert_eq!(new_lai.isr, vec![BrokerId(2), BrokerId(3)]);
        assert_eq!(notify, vec![BrokerId(2), BrokerId(3)]);
    }

    #[test]
    fn test_fails_when_no_isr_member_is_live() {
        let current = LeaderAndIsr::new(BrokerId(1), vec![BrokerId(1)], 0);
        let live: HashSet<BrokerId> = HashSet::new();
        let err = OfflinePartitionLeaderSelector
            .select_leader("orders", pid(), &current, &live)
            .unwrap_err();
        assert!(matches!(err, ControllerError::PartitionOffline { .. }));
    }

    #[test]
    fn test_preserves_version_for_conditional_write() {
        let current = LeaderAndIsr::new(BrokerId(1), vec![BrokerId(1), BrokerId(2)], 7);
        let live: HashSet<BrokerId> = [BrokerId(1), BrokerId(2)].into_iter().collect();
        let (new_lai, _) = OfflinePartitionLeaderSelector
            .select_leader("orders", pid(), &current, &live)
            .unwrap();
        assert_eq!(new_lai.version, 7);
    }
}
