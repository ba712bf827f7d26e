mod actor;
mod api;
mod replica;
mod server;
mod transport;
mod grpc {
    include!("../generated/paxos.rs");
}

pub use api::create_in_memory_cluster;
pub use api::try_create_paxos_replica;
pub use api::InMemoryCluster;
pub use api::InMemoryNode;
pub use api::PaxosClient;
pub use api::PaxosMemberInfo;
pub use api::PaxosOptions;
pub use api::PaxosReplica;
pub use api::PaxosReplicaConfig;
pub use api::PaxosReplicaCreationError;
pub use replica::ActorExited;
pub use replica::ClientHandleError;
pub use replica::LeaderChange;
pub use replica::LeaderChangeListener;
pub use replica::Learn;
pub use replica::QuorumCallError;
pub use replica::ReplicaId;
pub use replica::Response;
pub use replica::Round;
pub use replica::Slot;
pub use replica::Value;
pub use transport::ConnectError;

// `crate::{root_mod}` should not have any code. Just `mod` and `pub use` statements, and no `mod`
// is `pub`.
