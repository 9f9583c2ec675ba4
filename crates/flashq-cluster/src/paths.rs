//! Metadata store path conventions.
//!
//! - `/brokers/topics`: children are topic names.
//! - `/brokers/topics/<topic>`: data is the replica-assignment map for
//!   that topic's partitions.
//! - `/brokers/topics/<topic>/partitions/<partition>/state`: data is the
//!   serialized leader, ISR, and controller epoch record.

use crate::types::PartitionId;

pub fn topics_root() -> String {
    "/brokers/topics".to_string()
}

pub fn topic_path(topic: &str) -> String {
    format!("/brokers/topics/{topic}")
}

pub fn partition_state_path(topic: &str, partition: PartitionId) -> String {
    format!("/brokers/topics/{topic}/partitions/{partition}/state")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_path() {
        assert_eq!(topic_path("orders"), "/brokers/topics/orders");
    }

    #[test]
    fn test_partition_state_path() {
        assert_eq!(
            partition_state_path("orders", PartitionId::new(3)),
            "/brokers/topics/orders/partitions/3/state"
        );
    }
}
