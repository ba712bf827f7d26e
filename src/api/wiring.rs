use crate::actor;
use crate::api::client::PaxosClient;
use crate::api::options::PaxosOptionsValidated;
use crate::api::paxos_replica::PaxosReplica;
use crate::api::types::PaxosMemberInfo;
use crate::replica::{create_replica_node, ReplicaId, ReplicaNodeConfig};
use crate::server::{self, RpcServer};
use crate::transport::{ConnectError, Configuration, GrpcNode, LocalNode, NetworkSwitch, PaxosNode};
use crate::PaxosOptions;
use std::collections::HashSet;
use std::convert::TryFrom;
use std::sync::Arc;

const ACTOR_QUEUE_SIZE: usize = 100;

pub struct PaxosReplicaConfig {
    pub my_replica_id: i32,
    pub cluster_members: Vec<PaxosMemberInfo>,
    pub info_logger: slog::Logger,
    pub options: PaxosOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum PaxosReplicaCreationError {
    #[error("Illegal options for configuring replica: {0}")]
    IllegalOptions(String),
    #[error("Cluster config has no members")]
    EmptyCluster,
    #[error("Replica ID {0} appears more than once in cluster config")]
    DuplicateMember(i32),
    #[error("my replica ID not in cluster config")]
    MeNotInCluster,
    #[error("Failed to set up transport")]
    Transport(#[from] ConnectError),
}

/// Starts a replica that talks to its peers over gRPC, and serves them on its own member address.
pub async fn try_create_paxos_replica(config: PaxosReplicaConfig) -> Result<PaxosReplica, PaxosReplicaCreationError> {
    let my_id = config.my_replica_id;
    let options = PaxosOptionsValidated::try_from(config.options)
        .map_err(|e| PaxosReplicaCreationError::IllegalOptions(e.to_string()))?;
    validate_members(&config.cluster_members)?;

    let my_member_info = config
        .cluster_members
        .iter()
        .find(|member| member.replica_id == my_id)
        .ok_or(PaxosReplicaCreationError::MeNotInCluster)?;
    let my_server_addr = my_member_info.rpc_server_addr();
    let my_replica_id = ReplicaId::new(my_id);
    let logger = config.info_logger.new(slog::o!("ReplicaId" => my_id));

    let mut nodes = Vec::with_capacity(config.cluster_members.len());
    for member in config.cluster_members.iter() {
        let node: Arc<dyn PaxosNode> = Arc::new(GrpcNode::connect_lazy(
            member.ip_addr,
            member.rpc_port,
            options.rpc_timeout(),
        )?);
        nodes.push((member.id(), node));
    }
    let configuration = Arc::new(Configuration::new(logger.clone(), nodes));

    let (actor_client, actor_queue) = actor::channel(ACTOR_QUEUE_SIZE);
    let node = create_replica_node(
        &actor_client,
        actor_queue,
        ReplicaNodeConfig {
            logger: logger.clone(),
            my_replica_id,
            configuration,
            options: options.replica_node_options(),
        },
    )
    .map_err(|_| PaxosReplicaCreationError::MeNotInCluster)?;

    let (server_shutdown_handle, server_shutdown_signal) = server::shutdown_signal();
    let rpc_server = RpcServer::new(logger.clone(), actor_client.weak(), options.client_handle_timeout);
    tokio::spawn(rpc_server.run(my_server_addr, server_shutdown_signal));

    Ok(PaxosReplica::new(
        logger,
        my_replica_id,
        actor_client,
        node,
        Some(server_shutdown_handle),
        options.client_handle_timeout,
    ))
}

fn validate_members(cluster_members: &[PaxosMemberInfo]) -> Result<(), PaxosReplicaCreationError> {
    if cluster_members.is_empty() {
        return Err(PaxosReplicaCreationError::EmptyCluster);
    }

    let mut seen = HashSet::with_capacity(cluster_members.len());
    for member in cluster_members {
        if !seen.insert(member.replica_id) {
            return Err(PaxosReplicaCreationError::DuplicateMember(member.replica_id));
        }
    }

    Ok(())
}

/// A whole cluster inside one process, wired over in-memory links instead of gRPC.
pub struct InMemoryCluster {
    nodes: Vec<InMemoryNode>,
    client_configuration: Arc<Configuration>,
    client_handle_timeout: tokio::time::Duration,
}

impl InMemoryCluster {
    pub fn nodes(&self) -> &[InMemoryNode] {
        &self.nodes
    }

    pub fn node(&self, replica_id: ReplicaId) -> Option<&InMemoryNode> {
        self.nodes.iter().find(|node| node.replica.id() == replica_id)
    }

    /// A client that reaches every node, and is never cut off itself.
    pub fn client(&self) -> PaxosClient {
        PaxosClient::new(self.client_configuration.clone(), self.client_handle_timeout)
    }
}

pub struct InMemoryNode {
    replica: PaxosReplica,
    switch: NetworkSwitch,
}

impl InMemoryNode {
    pub fn replica(&self) -> &PaxosReplica {
        &self.replica
    }

    /// Cuts the node off the network. It keeps running, but nothing gets in or out.
    pub fn crash(&self) {
        self.switch.set_connected(false);
    }

    pub fn recover(&self) {
        self.switch.set_connected(true);
    }
}

/// Starts `num_nodes` replicas with ids `0..num_nodes`.
pub async fn create_in_memory_cluster(
    num_nodes: usize,
    logger: slog::Logger,
    options: PaxosOptions,
) -> Result<InMemoryCluster, PaxosReplicaCreationError> {
    let options =
        PaxosOptionsValidated::try_from(options).map_err(|e| PaxosReplicaCreationError::IllegalOptions(e.to_string()))?;
    if num_nodes == 0 {
        return Err(PaxosReplicaCreationError::EmptyCluster);
    }

    let ids: Vec<ReplicaId> = (0..num_nodes as i32).map(ReplicaId::new).collect();
    let switches: Vec<NetworkSwitch> = ids.iter().map(|_| NetworkSwitch::new()).collect();
    let channels: Vec<_> = ids.iter().map(|_| actor::channel(ACTOR_QUEUE_SIZE)).collect();

    let links_from = |source_switch: &NetworkSwitch| -> Vec<(ReplicaId, Arc<dyn PaxosNode>)> {
        ids.iter()
            .zip(switches.iter())
            .zip(channels.iter())
            .map(|((id, target_switch), (target, _))| {
                let node: Arc<dyn PaxosNode> = Arc::new(LocalNode::new(
                    target.weak(),
                    target_switch.clone(),
                    source_switch.clone(),
                    options.client_handle_timeout,
                ));
                (*id, node)
            })
            .collect()
    };

    let client_configuration = Arc::new(Configuration::new(
        logger.new(slog::o!("Client" => "in-memory")),
        links_from(&NetworkSwitch::new()),
    ));
    let configurations: Vec<Arc<Configuration>> = ids
        .iter()
        .zip(switches.iter())
        .map(|(id, switch)| {
            let node_logger = logger.new(slog::o!("ReplicaId" => id.as_i32()));
            Arc::new(Configuration::new(node_logger, links_from(switch)))
        })
        .collect();

    let mut nodes = Vec::with_capacity(num_nodes);
    for (((id, switch), (actor_client, actor_queue)), configuration) in ids
        .iter()
        .zip(switches.into_iter())
        .zip(channels.into_iter())
        .zip(configurations.into_iter())
    {
        let node_logger = logger.new(slog::o!("ReplicaId" => id.as_i32()));
        let node = create_replica_node(
            &actor_client,
            actor_queue,
            ReplicaNodeConfig {
                logger: node_logger.clone(),
                my_replica_id: *id,
                configuration,
                options: options.replica_node_options(),
            },
        )
        .map_err(|_| PaxosReplicaCreationError::MeNotInCluster)?;
        let replica = PaxosReplica::new(node_logger, *id, actor_client, node, None, options.client_handle_timeout);

        nodes.push(InMemoryNode { replica, switch });
    }

    Ok(InMemoryCluster {
        nodes,
        client_configuration,
        client_handle_timeout: options.client_handle_timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn member(replica_id: i32) -> PaxosMemberInfo {
        PaxosMemberInfo {
            replica_id,
            ip_addr: Ipv4Addr::LOCALHOST,
            rpc_port: 4000 + replica_id as u16,
        }
    }

    fn config(my_replica_id: i32, cluster_members: Vec<PaxosMemberInfo>) -> PaxosReplicaConfig {
        PaxosReplicaConfig {
            my_replica_id,
            cluster_members,
            info_logger: slog::Logger::root(slog::Discard, slog::o!()),
            options: PaxosOptions::default(),
        }
    }

    #[tokio::test]
    async fn rejects_unknown_own_id() {
        let result = try_create_paxos_replica(config(7, vec![member(0), member(1), member(2)])).await;

        assert!(matches!(result, Err(PaxosReplicaCreationError::MeNotInCluster)));
    }

    #[tokio::test]
    async fn rejects_duplicate_members() {
        let result = try_create_paxos_replica(config(0, vec![member(0), member(1), member(1)])).await;

        assert!(matches!(result, Err(PaxosReplicaCreationError::DuplicateMember(1))));
    }

    #[tokio::test]
    async fn rejects_empty_cluster() {
        let result = try_create_paxos_replica(config(0, vec![])).await;

        assert!(matches!(result, Err(PaxosReplicaCreationError::EmptyCluster)));
    }

    #[tokio::test]
    async fn in_memory_cluster_starts_with_highest_id_as_leader() {
        let cluster = create_in_memory_cluster(3, slog::Logger::root(slog::Discard, slog::o!()), PaxosOptions::default())
            .await
            .unwrap();

        for node in cluster.nodes() {
            assert_eq!(node.replica().leader(), Some(ReplicaId::new(2)));
        }
    }
}
