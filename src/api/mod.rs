//! This mod is meant to hold most of the code for the library's client-facing API.
mod client;
mod options;
mod paxos_replica;
mod types;
mod wiring;

pub use client::PaxosClient;
pub use options::PaxosOptions;
pub use paxos_replica::PaxosReplica;
pub use types::PaxosMemberInfo;
pub use wiring::create_in_memory_cluster;
pub use wiring::try_create_paxos_replica;
pub use wiring::InMemoryCluster;
pub use wiring::InMemoryNode;
pub use wiring::PaxosReplicaConfig;
pub use wiring::PaxosReplicaCreationError;
