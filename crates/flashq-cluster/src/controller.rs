//! Partition state machine, the controller core.
//!
//! Owns `(topic, partition) → PartitionState`, exposes the transition
//! entry points, enforces the legal-previous-state rule, and orchestrates
//! the metadata store, broker request batch, and leader selectors.

use crate::batch::{BrokerRequestBatch, BrokerSender};
use crate::context::ControllerContext;
use crate::config::ControllerConfig;
use crate::error::{ControllerError, StateChangeFailure};
use crate::listener::TopicChangeListener;
use crate::metadata_store::{ConditionalUpdateResult, MetadataStore};
use crate::metrics::ControllerMetrics;
use crate::paths;
use crate::selector::{OfflinePartitionLeaderSelector, PartitionLeaderSelector};
use crate::state::PartitionState;
use crate::types::{BrokerId, Epoch, LeaderAndIsr, LeaderIsrAndControllerEpoch, PartitionId, ReplicaAssignment, TopicPartition};
use crate::wire;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Inner {
    context: ControllerContext,
    partition_states: HashMap<TopicPartition, PartitionState>,
}

/// The controller's partition lifecycle engine.
///
/// All mutations to `context`/`partition_states` happen under the single
/// `inner` lock (the controller lock); this crate performs no internal
/// parallelism.
pub struct PartitionStateMachine {
    metadata_store: Arc<dyn MetadataStore>,
    broker_sender: Arc<dyn BrokerSender>,
    metrics: Arc<dyn ControllerMetrics>,
    config: ControllerConfig,
    inner: Mutex<Inner>,
    shutdown: AtomicBool,
}

impl PartitionStateMachine {
    pub fn new(
        metadata_store: Arc<dyn MetadataStore>,
        broker_sender: Arc<dyn BrokerSender>,
        metrics: Arc<dyn ControllerMetrics>,
        epoch: Epoch,
        config: ControllerConfig,
    ) -> Self {
        Self {
            metadata_store,
            broker_sender,
            metrics,
            config,
            inner: Mutex::new(Inner {
                context: ControllerContext::new(epoch),
                partition_states: HashMap::new(),
            }),
            shutdown: AtomicBool::new(true),
        }
    }

    pub fn metadata_store(&self) -> &dyn MetadataStore {
        self.metadata_store.as_ref()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn epoch(&self) -> Epoch {
        self.inner.lock().context.epoch()
    }

    pub fn set_live_broker_ids(&self, ids: HashSet<BrokerId>) {
        self.inner.lock().context.set_live_broker_ids(ids);
    }

    pub fn partition_state(&self, tp: &TopicPartition) -> PartitionState {
        *self
            .inner
            .lock()
            .partition_states
            .get(tp)
            .unwrap_or(&PartitionState::NonExistent)
    }

    pub fn leader_and_isr(&self, tp: &TopicPartition) -> Option<LeaderIsrAndControllerEpoch> {
        self.inner.lock().context.leader_and_isr(tp).cloned()
    }

    /// Idempotent: clears the shutdown flag, rebuilds in-memory state
    /// from durable metadata, attempts to bring every `New`/`Offline`
    /// partition online, then registers the topic listener.
    pub fn startup(self: &Arc<Self>) -> Result<(), ControllerError> {
        self.shutdown.store(false, Ordering::SeqCst);
        self.initialize_partition_state()?;
        self.trigger_online_partition_state_change()?;
        Arc::new(TopicChangeListener::new(Arc::clone(self))).register();
        Ok(())
    }

    /// Marks the controller as shutting down and drops all cached
    /// partition state.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.inner.lock().partition_states.clear();
    }

    /// The bulk driver. Per-partition errors are logged and do not abort
    /// the loop; a batch-flush error propagates.
    pub fn handle_state_changes(
        &self,
        partitions: &[TopicPartition],
        target: PartitionState,
        selector: &dyn PartitionLeaderSelector,
    ) -> Result<(), ControllerError> {
        let mut batch = BrokerRequestBatch::new(self.broker_sender.as_ref(), self.metrics.as_ref());

        for tp in partitions {
            if let Err(e) = self.handle_state_change(tp, target, selector, &mut batch) {
                tracing::error!(topic = %tp.topic, partition = %tp.partition, error = %e, "state change failed");
            }
        }

        let (epoch, live_brokers) = {
            let inner = self.inner.lock();
            (inner.context.epoch(), inner.context.live_broker_ids().clone())
        };
        batch.send_requests_to_brokers(epoch, &live_brokers)
    }

    /// Scans the state map for every partition in `New` or `Offline` and
    /// attempts to bring it `Online`.
    pub fn trigger_online_partition_state_change(&self) -> Result<(), ControllerError> {
        let partitions: Vec<TopicPartition> = {
            let inner = self.inner.lock();
            inner
                .partition_states
                .iter()
                .filter(|(_, state)| matches!(state, PartitionState::New | PartitionState::Offline))
                .map(|(tp, _)| tp.clone())
                .collect()
        };
        self.handle_state_changes(&partitions, PartitionState::Online, &OfflinePartitionLeaderSelector)
    }

    /// Exposed directly for the reassignment subsystem and broker-failure
    /// handlers.
    pub fn elect_leader_for_partition(
        &self,
        topic: &str,
        partition: PartitionId,
        selector: &dyn PartitionLeaderSelector,
    ) -> Result<(), ControllerError> {
        let tp = TopicPartition::new(topic, partition);
        self.handle_state_changes(&[tp], PartitionState::Online, selector)
    }

    fn handle_state_change(
        &self,
        tp: &TopicPartition,
        target: PartitionState,
        selector: &dyn PartitionLeaderSelector,
        batch: &mut BrokerRequestBatch,
    ) -> Result<(), ControllerError> {
        let mut inner = self.inner.lock();
        let current = *inner
            .partition_states
            .get(tp)
            .unwrap_or(&PartitionState::NonExistent);

        if !current.can_transition_to(target) {
            return Err(ControllerError::illegal_transition(
                tp.topic.clone(),
                tp.partition,
                current.name(),
                target.name(),
            ));
        }

        match target {
            PartitionState::New => {
                let assignment = self.read_replica_assignment(tp)?;
                inner.context.set_replica_assignment(tp.clone(), assignment);
                inner.partition_states.insert(tp.clone(), PartitionState::New);
                Ok(())
            }
            PartitionState::Online => {
                let result = match current {
                    PartitionState::New => self.initialize_leader_and_isr_for_partition(tp, &mut inner, batch),
                    PartitionState::Offline | PartitionState::Online => {
                        self.elect_leader(tp, selector, &mut inner, batch)
                    }
                    PartitionState::NonExistent => {
                        unreachable!("can_transition_to already rejects NonExistent -> Online")
                    }
                };
                if result.is_ok() {
                    inner.partition_states.insert(tp.clone(), PartitionState::Online);
                }
                result
            }
            PartitionState::Offline => {
                inner.partition_states.insert(tp.clone(), PartitionState::Offline);
                Ok(())
            }
            PartitionState::NonExistent => {
                inner.partition_states.insert(tp.clone(), PartitionState::NonExistent);
                Ok(())
            }
        }
    }

    fn read_replica_assignment(&self, tp: &TopicPartition) -> Result<ReplicaAssignment, ControllerError> {
        let Some((bytes, _version)) = self.metadata_store.read_data(&paths::topic_path(&tp.topic))? else {
            return Err(ControllerError::TopicNotFound {
                topic: tp.topic.clone(),
            });
        };
        let assignments = wire::decode_replica_assignments(&bytes).map_err(|reason| {
            ControllerError::MetadataStoreError {
                context: paths::topic_path(&tp.topic),
                reason,
            }
        })?;
        assignments
            .get(&tp.partition)
            .cloned()
            .ok_or(ControllerError::PartitionNotFound {
                topic: tp.topic.clone(),
                partition: tp.partition,
            })
    }

    /// Used only for a partition that has never had a durable leader/ISR
    /// node.
    fn initialize_leader_and_isr_for_partition(
        &self,
        tp: &TopicPartition,
        inner: &mut Inner,
        batch: &mut BrokerRequestBatch,
    ) -> Result<(), ControllerError> {
        let assignment =
            inner
                .context
                .replica_assignment(tp)
                .cloned()
                .ok_or(ControllerError::PartitionNotFound {
                    topic: tp.topic.clone(),
                    partition: tp.partition,
                })?;

        let live_assigned_replicas = assignment.live_subset(inner.context.live_broker_ids());
        if live_assigned_replicas.is_empty() {
            self.metrics.incr_offline_partition_rate();
            return Err(ControllerError::state_change_failed(
                tp.topic.clone(),
                tp.partition,
                StateChangeFailure::NoLiveReplica,
            ));
        }

        let leader = live_assigned_replicas[0];
        let isr = live_assigned_replicas.clone();
        let controller_epoch = inner.context.epoch();
        let leader_and_isr = LeaderAndIsr::new(leader, isr, 0);
        let entry = LeaderIsrAndControllerEpoch {
            leader_and_isr: leader_and_isr.clone(),
            controller_epoch,
        };

        let path = paths::partition_state_path(&tp.topic, tp.partition);
        match self.metadata_store.create_persistent(&path, wire::WireLeaderIsr::encode(&entry)) {
            Ok(()) => {
                batch.add_leader_and_isr_request_for_brokers(
                    &live_assigned_replicas,
                    &tp.topic,
                    tp.partition,
                    &leader_and_isr,
                    assignment.replicas().to_vec(),
                );
                inner.context.set_leader_and_isr(tp.clone(), entry);
                Ok(())
            }
            Err(ControllerError::NodeAlreadyExists { path }) => {
                self.metrics.incr_offline_partition_rate();
                let existing = match self.metadata_store.read_data(&path)? {
                    Some((bytes, version)) => wire::WireLeaderIsr::decode(&bytes, version).map_err(|reason| {
                        ControllerError::MetadataStoreError {
                            context: path.clone(),
                            reason,
                        }
                    })?,
                    None => {
                        return Err(ControllerError::MetadataStoreError {
                            context: path,
                            reason: "node reported as existing but vanished on read".to_string(),
                        });
                    }
                };
                tracing::warn!(
                    topic = %tp.topic,
                    partition = %tp.partition,
                    existing_leader = %existing.leader_and_isr.leader,
                    "leader/ISR node already existed when creating it, another controller must have raced us"
                );
                Err(ControllerError::state_change_failed(
                    tp.topic.clone(),
                    tp.partition,
                    StateChangeFailure::NodeAlreadyExists {
                        existing: Box::new(existing),
                    },
                ))
            }
            Err(other) => Err(other),
        }
    }

    /// Used when a durable node already exists and may need updating.
    /// Retries until the conditional write succeeds, a fresher controller
    /// is observed, or the configured retry cap is hit.
    fn elect_leader(
        &self,
        tp: &TopicPartition,
        selector: &dyn PartitionLeaderSelector,
        inner: &mut Inner,
        batch: &mut BrokerRequestBatch,
    ) -> Result<(), ControllerError> {
        let path = paths::partition_state_path(&tp.topic, tp.partition);
        let self_epoch = inner.context.epoch();
        let assignment =
            inner
                .context
                .replica_assignment(tp)
                .cloned()
                .ok_or(ControllerError::PartitionNotFound {
                    topic: tp.topic.clone(),
                    partition: tp.partition,
                })?;
        let live_broker_ids = inner.context.live_broker_ids().clone();

        for _attempt in 0..self.config.max_election_retries {
            let Some((bytes, version)) = self.metadata_store.read_data(&path)? else {
                return Err(ControllerError::state_change_failed(
                    tp.topic.clone(),
                    tp.partition,
                    StateChangeFailure::LeaderNodeMissing,
                ));
            };
            let stored = wire::WireLeaderIsr::decode(&bytes, version).map_err(|reason| {
                ControllerError::MetadataStoreError {
                    context: path.clone(),
                    reason,
                }
            })?;

            if stored.controller_epoch > self_epoch {
                return Err(ControllerError::state_change_failed(
                    tp.topic.clone(),
                    tp.partition,
                    StateChangeFailure::StaleController {
                        stored_epoch: stored.controller_epoch,
                        self_epoch,
                    },
                ));
            }

            let (new_leader_and_isr, notify_replicas) =
                selector.select_leader(&tp.topic, tp.partition, &stored.leader_and_isr, &live_broker_ids)?;

            let candidate_entry = LeaderIsrAndControllerEpoch {
                leader_and_isr: new_leader_and_isr.clone(),
                controller_epoch: self_epoch,
            };
            let data = wire::WireLeaderIsr::encode(&candidate_entry);

            match self.metadata_store.conditional_update(&path, data, version)? {
                ConditionalUpdateResult::Success { new_version } => {
                    let final_leader_and_isr =
                        LeaderAndIsr::new(new_leader_and_isr.leader, new_leader_and_isr.isr.clone(), new_version);
                    let final_entry = LeaderIsrAndControllerEpoch {
                        leader_and_isr: final_leader_and_isr.clone(),
                        controller_epoch: self_epoch,
                    };
                    inner.context.set_leader_and_isr(tp.clone(), final_entry);
                    batch.add_leader_and_isr_request_for_brokers(
                        &notify_replicas,
                        &tp.topic,
                        tp.partition,
                        &final_leader_and_isr,
                        assignment.replicas().to_vec(),
                    );
                    return Ok(());
                }
                ConditionalUpdateResult::VersionMismatch { .. } => continue,
            }
        }

        Err(ControllerError::state_change_failed(
            tp.topic.clone(),
            tp.partition,
            StateChangeFailure::RetriesExhausted {
                attempts: self.config.max_election_retries,
            },
        ))
    }

    /// Runs once at controller startup. No durable writes; only
    /// populates the in-memory map from durable metadata.
    fn initialize_partition_state(&self) -> Result<(), ControllerError> {
        let mut inner = self.inner.lock();
        let topics = self.metadata_store.get_children(&paths::topics_root())?;
        inner.context.set_all_topics(topics.iter().cloned().collect());

        for topic in &topics {
            let Some((bytes, _version)) = self.metadata_store.read_data(&paths::topic_path(topic))? else {
                continue;
            };
            let assignments = wire::decode_replica_assignments(&bytes).map_err(|reason| {
                ControllerError::MetadataStoreError {
                    context: paths::topic_path(topic),
                    reason,
                }
            })?;

            for (partition, assignment) in assignments {
                let tp = TopicPartition::new(topic.clone(), partition);
                inner.context.set_replica_assignment(tp.clone(), assignment);

                let state_path = paths::partition_state_path(topic, partition);
                let state = match self.metadata_store.read_data(&state_path)? {
                    None => PartitionState::New,
                    Some((bytes, version)) => {
                        let stored = wire::WireLeaderIsr::decode(&bytes, version).map_err(|reason| {
                            ControllerError::MetadataStoreError {
                                context: state_path.clone(),
                                reason,
                            }
                        })?;
                        let online = inner.context.is_live(stored.leader_and_isr.leader);
                        inner.context.set_leader_and_isr(tp.clone(), stored);
                        if online {
                            PartitionState::Online
                        } else {
                            PartitionState::Offline
                        }
                    }
                };
                inner.partition_states.insert(tp, state);
            }
        }

        Ok(())
    }

    /// Invoked by [`TopicChangeListener`] with the topics directory's
    /// current child set. Returns the set of topics newly discovered and
    /// the set of topics no longer present.
    pub(crate) fn apply_topic_change(&self, current_children: &HashSet<String>) -> (HashSet<String>, HashSet<String>) {
        let mut inner = self.inner.lock();
        let existing = inner.context.all_topics().clone();
        let new_topics: HashSet<String> = current_children.difference(&existing).cloned().collect();
        let deleted_topics: HashSet<String> = existing.difference(current_children).cloned().collect();
        inner.context.set_all_topics(current_children.clone());

        for topic in &new_topics {
            if let Ok(Some((bytes, _))) = self.metadata_store.read_data(&paths::topic_path(topic)) {
                if let Ok(assignments) = wire::decode_replica_assignments(&bytes) {
                    for (partition, assignment) in assignments {
                        inner
                            .context
                            .set_replica_assignment(TopicPartition::new(topic.clone(), partition), assignment);
                    }
                }
            }
        }

        for topic in &deleted_topics {
            let stale: Vec<TopicPartition> = inner.context.partitions_for_topic(topic).cloned().collect();
            for tp in stale {
                inner.context.remove_replica_assignment(&tp);
            }
        }

        (new_topics, deleted_topics)
    }

    /// Drives `NonExistent -> New -> Online` for every partition of every
    /// newly discovered topic.
    pub(crate) fn on_new_topic_creation(&self, new_topics: &HashSet<String>) {
        let mut new_partitions = Vec::new();
        for topic in new_topics {
            match self.metadata_store.read_data(&paths::topic_path(topic)) {
                Ok(Some((bytes, _))) => match wire::decode_replica_assignments(&bytes) {
                    Ok(assignments) => {
                        for partition in assignments.keys() {
                            new_partitions.push(TopicPartition::new(topic.clone(), *partition));
                        }
                    }
                    Err(reason) => tracing::error!(%topic, %reason, "failed to decode replica assignment map"),
                },
                Ok(None) => tracing::warn!(%topic, "topic has no replica-assignment node"),
                Err(e) => tracing::error!(%topic, error = %e, "failed to read replica assignment map"),
            }
        }

        if new_partitions.is_empty() {
            return;
        }

        if let Err(e) = self.handle_state_changes(&new_partitions, PartitionState::New, &OfflinePartitionLeaderSelector) {
            tracing::error!(error = %e, "failed driving NonExistent -> New for new topics");
            return;
        }
        if let Err(e) =
            self.handle_state_changes(&new_partitions, PartitionState::Online, &OfflinePartitionLeaderSelector)
        {
            tracing::error!(error = %e, "failed driving New -> Online for new topics");
        }
    }
}
