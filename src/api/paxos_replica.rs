use crate::actor::ActorClient;
use crate::replica::{
    ActorExited, ClientHandleError, LeaderChangeListener, Learn, ReplicaId, ReplicaNode, Response, Value,
};
use crate::server::RpcServerShutdownHandle;
use tokio::time::Duration;

/// Handle to a running replica. Dropping it stops the replica.
pub struct PaxosReplica {
    logger: slog::Logger,
    my_replica_id: ReplicaId,
    actor_client: Option<ActorClient>,
    node: ReplicaNode,
    server_shutdown: Option<RpcServerShutdownHandle>,
    client_handle_timeout: Duration,
}

impl PaxosReplica {
    pub(crate) fn new(
        logger: slog::Logger,
        my_replica_id: ReplicaId,
        actor_client: ActorClient,
        node: ReplicaNode,
        server_shutdown: Option<RpcServerShutdownHandle>,
        client_handle_timeout: Duration,
    ) -> Self {
        PaxosReplica {
            logger,
            my_replica_id,
            actor_client: Some(actor_client),
            node,
            server_shutdown,
            client_handle_timeout,
        }
    }

    pub fn id(&self) -> ReplicaId {
        self.my_replica_id
    }

    /// Queues `value` on this replica and waits until it is decided. Only the leader proposes, so
    /// on a follower this resolves once the leader got the same value decided.
    pub async fn client_handle(&self, value: Value) -> Result<Response, ClientHandleError> {
        self.actor_client()?
            .client_handle(value, self.client_handle_timeout)
            .await
    }

    pub fn leader(&self) -> Option<ReplicaId> {
        self.node.leader_detector.leader()
    }

    pub fn subscribe_leader_changes(&self) -> LeaderChangeListener {
        self.node.leader_detector.subscribe()
    }

    /// The contiguous prefix of decided slots, in slot order.
    pub async fn decided_log(&self) -> Result<Vec<Learn>, ActorExited> {
        self.actor_client()?.decided_log().await
    }

    pub fn shutdown(&mut self) {
        if self.actor_client.take().is_none() {
            return;
        }
        slog::info!(self.logger, "Shutting down replica {:?}", self.my_replica_id);

        self.node.failure_detector.stop();
        if let Some(mut handle) = self.server_shutdown.take() {
            handle.shutdown();
        }
    }

    fn actor_client(&self) -> Result<&ActorClient, ActorExited> {
        self.actor_client.as_ref().ok_or(ActorExited)
    }
}

impl Drop for PaxosReplica {
    fn drop(&mut self) {
        self.shutdown();
    }
}
