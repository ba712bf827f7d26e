mod acceptor;
mod detector;
mod proposer;
mod quorum;
mod replica;
mod replica_api;
mod replica_wiring;
mod types;

pub(crate) use detector::HeartbeatSender;
pub use detector::LeaderChange;
pub use detector::LeaderChangeListener;
pub(crate) use quorum::PaxosQuorumSpec;
pub(crate) use replica::Replica;
pub use replica_api::ActorExited;
pub use replica_api::ClientHandleError;
pub(crate) use replica_api::{NotAMember, PhaseOneResult, PhaseTwoResult, ProposalEpoch};
pub use replica_api::QuorumCallError;
pub(crate) use replica_api::RpcError;
pub(crate) use replica_wiring::{create_replica_node, ReplicaNode, ReplicaNodeConfig, ReplicaNodeOptions};
pub(crate) use types::{Accept, Heartbeat, HeartbeatKind, PValue, Prepare, Promise};
pub use types::{Learn, ReplicaId, Response, Round, Slot, Value};
