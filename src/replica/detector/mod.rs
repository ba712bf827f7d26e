mod failure_detector;
mod leader_detector;
mod time;

pub(crate) use failure_detector::FailureDetector;
pub(crate) use failure_detector::HeartbeatSender;
pub use leader_detector::LeaderChange;
pub use leader_detector::LeaderChangeListener;
pub(crate) use leader_detector::LeaderDetector;

use crate::replica::types::ReplicaId;

/// Sink for liveness transitions produced by the failure detector.
pub(crate) trait SuspectRestorer: Send + Sync + 'static {
    fn suspect(&self, id: ReplicaId);
    fn restore(&self, id: ReplicaId);
}
