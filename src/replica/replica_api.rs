use crate::replica::types::{Accept, Learn, Promise, ReplicaId};
use tokio::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("Replica actor is dead RIP")]
pub struct ActorExited;

/// A quorum call that did not gather enough valid replies. Both cases are retryable.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum QuorumCallError {
    #[error("Quorum call timed out with {replies} replies, {quorum} matching replies required")]
    QuorumTimeout { replies: usize, quorum: usize },

    #[error("Every node answered with {replies} replies but no {quorum} of them agreed")]
    QuorumUnreachable { replies: usize, quorum: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ClientHandleError {
    // The request may still be decided later. Retrying with the same value is safe.
    #[error("Request was not decided within {0:?}")]
    Timeout(Duration),

    // Replica logic runs on a background task. This error is returned if the task has exited.
    #[error("Replica task has exited")]
    ReplicaExited,
}

#[derive(Debug, thiserror::Error)]
#[error("Replica {0:?} is not part of the configuration")]
pub(crate) struct NotAMember(pub(crate) ReplicaId);

/// Failure talking to a single node. Quorum calls count it as "no reply".
#[derive(Debug, thiserror::Error)]
pub(crate) enum RpcError {
    #[error("Node is unreachable: {0}")]
    Unreachable(String),

    #[error("Rpc failed: {0:?}")]
    Status(#[from] tonic::Status),

    #[error("Malformed reply: {0}")]
    Malformed(String),

    #[error("Node failed to serve the request: {0}")]
    ServerFault(String),
}

/// Tags background quorum calls so results from abandoned phases can be recognized.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct ProposalEpoch(u64);

impl ProposalEpoch {
    pub(crate) fn initial() -> Self {
        ProposalEpoch(0)
    }

    pub(crate) fn incr(&mut self) {
        self.0 += 1;
    }
}

#[derive(Debug)]
pub(crate) struct PhaseOneResult {
    pub(crate) epoch: ProposalEpoch,
    pub(crate) result: Result<Promise, QuorumCallError>,
}

#[derive(Debug)]
pub(crate) struct PhaseTwoResult {
    pub(crate) epoch: ProposalEpoch,
    pub(crate) accept: Accept,
    pub(crate) result: Result<Learn, QuorumCallError>,
}

// ------- Conversions --------

impl From<ActorExited> for ClientHandleError {
    fn from(_: ActorExited) -> Self {
        ClientHandleError::ReplicaExited
    }
}

impl From<ActorExited> for RpcError {
    fn from(e: ActorExited) -> Self {
        RpcError::Unreachable(e.to_string())
    }
}
