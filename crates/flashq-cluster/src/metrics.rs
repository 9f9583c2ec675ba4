//! Metrics sink injected into the controller.
//!
//! Metrics registration is out of scope for this crate: it only calls out
//! to whatever counters the host process wires up, the same way
//! `ClusterServiceImpl` treats its `ClusterBroker`/`ClusterClient`
//! collaborators as optional, injected dependencies.

use crate::types::BrokerId;

/// Counters the controller updates as it drives partitions online and
/// notifies brokers.
pub trait ControllerMetrics: Send + Sync {
    /// Incremented whenever a partition fails to come online because no
    /// assigned replica is alive.
    fn incr_offline_partition_rate(&self);

    /// Incremented once per outgoing `LeaderAndIsr` request, so callers
    /// can track per-broker request rate and bytes sent.
    fn record_broker_request(&self, broker: BrokerId, approx_bytes: usize);
}

/// Default no-op sink, used when the host process has not wired up a
/// metrics backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl ControllerMetrics for NoopMetrics {
    fn incr_offline_partition_rate(&self) {}
    fn record_broker_request(&self, _broker: BrokerId, _approx_bytes: usize) {}
}

/// A sink that simply logs each counter event, useful for development
/// and for tests that want to observe controller behavior without a real
/// metrics backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMetrics;

impl ControllerMetrics for LoggingMetrics {
    fn incr_offline_partition_rate(&self) {
        tracing::debug!("metric offline-partition-rate += 1");
    }

    fn record_broker_request(&self, broker: BrokerId, approx_bytes: usize) {
        tracing::debug!(%broker, approx_bytes, "metric broker-request-rate += 1");
    }
}
