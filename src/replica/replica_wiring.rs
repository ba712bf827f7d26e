use crate::actor::{ActorClient, ActorQueue, WeakActorClient};
use crate::replica::detector::{FailureDetector, LeaderChangeListener, LeaderDetector};
use crate::replica::replica::{ProposerTimeouts, Replica, ReplicaConfig};
use crate::replica::replica_api::NotAMember;
use crate::replica::types::ReplicaId;
use crate::transport::Configuration;
use std::sync::Arc;
use tokio::time::Duration;

pub(crate) struct ReplicaNodeConfig {
    pub(crate) logger: slog::Logger,
    pub(crate) my_replica_id: ReplicaId,
    pub(crate) configuration: Arc<Configuration>,
    pub(crate) options: ReplicaNodeOptions,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct ReplicaNodeOptions {
    pub(crate) failure_detector_delay: Duration,
    pub(crate) failure_detector_delta: Duration,
    pub(crate) prepare_timeout: Duration,
    pub(crate) accept_timeout: Duration,
    pub(crate) retry_delay: Duration,
}

/// Handles to the parts of a running node that live outside the replica actor.
pub(crate) struct ReplicaNode {
    pub(crate) leader_detector: LeaderDetector,
    pub(crate) failure_detector: Arc<FailureDetector<LeaderDetector>>,
}

/// Wires detectors, acceptor and proposer of one node together and starts its actor on `queue`.
pub(crate) fn create_replica_node(
    actor_client: &ActorClient,
    queue: ActorQueue,
    config: ReplicaNodeConfig,
) -> Result<ReplicaNode, NotAMember> {
    let node_ids = config.configuration.node_ids();
    let options = config.options;

    let leader_detector = LeaderDetector::new(config.logger.clone(), &node_ids);
    let failure_detector = Arc::new(FailureDetector::new(
        config.logger.clone(),
        config.my_replica_id,
        &node_ids,
        options.failure_detector_delay,
        options.failure_detector_delta,
        leader_detector.clone(),
        config.configuration.clone(),
    ));

    // Subscribe before reading the current leader so no change can slip in between.
    let leader_changes = leader_detector.subscribe();
    let initial_leader = leader_detector.leader();
    slog::info!(config.logger, "Starting replica, initial leader {:?}", initial_leader);

    let replica = Replica::new(ReplicaConfig {
        logger: config.logger,
        my_replica_id: config.my_replica_id,
        configuration: config.configuration,
        failure_detector: failure_detector.clone(),
        initial_leader,
        actor_client: actor_client.weak(),
        timeouts: ProposerTimeouts {
            prepare_timeout: options.prepare_timeout,
            accept_timeout: options.accept_timeout,
            retry_delay: options.retry_delay,
        },
    })?;
    queue.spawn(replica);
    tokio::spawn(forward_leader_changes(leader_changes, actor_client.weak()));

    Ok(ReplicaNode {
        leader_detector,
        failure_detector,
    })
}

async fn forward_leader_changes(mut leader_changes: LeaderChangeListener, actor_client: WeakActorClient) {
    while let Some(change) = leader_changes.next().await {
        let delivered = match actor_client.upgrade() {
            Ok(actor_client) => actor_client.leader_change(change.leader).await,
            Err(e) => Err(e),
        };
        if delivered.is_err() {
            return;
        }
    }
}
