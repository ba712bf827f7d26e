use crate::replica::detector::SuspectRestorer;
use crate::replica::types::ReplicaId;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LeaderChange {
    /// `None` when every eligible node is suspected.
    pub leader: Option<ReplicaId>,
}

/// Monarchical leader detector: the trusted leader is the highest non-suspected, non-negative id.
///
/// Cloning is cheap and every clone observes the same state.
#[derive(Clone)]
pub(crate) struct LeaderDetector {
    inner: Arc<Mutex<LeaderDetectorState>>,
    logger: slog::Logger,
}

struct LeaderDetectorState {
    node_ids: BTreeSet<ReplicaId>,
    suspected: HashSet<ReplicaId>,
    leader: Option<ReplicaId>,
    subscribers: Vec<mpsc::UnboundedSender<LeaderChange>>,
}

impl LeaderDetector {
    pub(crate) fn new(logger: slog::Logger, node_ids: &[ReplicaId]) -> Self {
        let mut state = LeaderDetectorState {
            node_ids: node_ids.iter().copied().collect(),
            suspected: HashSet::new(),
            leader: None,
            subscribers: Vec::new(),
        };
        state.leader = state.compute_leader();

        LeaderDetector {
            inner: Arc::new(Mutex::new(state)),
            logger,
        }
    }

    pub(crate) fn leader(&self) -> Option<ReplicaId> {
        self.lock().leader
    }

    /// Each subscriber receives every leader change published after it subscribed.
    pub(crate) fn subscribe(&self) -> LeaderChangeListener {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);

        LeaderChangeListener { rx }
    }

    fn update_suspicion(&self, id: ReplicaId, suspected: bool) {
        let mut state = self.lock();
        if suspected {
            state.suspected.insert(id);
        } else {
            state.suspected.remove(&id);
        }

        let new_leader = state.compute_leader();
        if new_leader == state.leader {
            return;
        }

        slog::info!(self.logger, "Leader changed from {:?} to {:?}", state.leader, new_leader);
        state.leader = new_leader;
        let change = LeaderChange { leader: new_leader };
        state.subscribers.retain(|subscriber| subscriber.send(change).is_ok());
    }

    fn lock(&self) -> MutexGuard<'_, LeaderDetectorState> {
        // State is always left consistent, so a poisoned lock is still usable.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl LeaderDetectorState {
    fn compute_leader(&self) -> Option<ReplicaId> {
        self.node_ids
            .iter()
            .rev()
            .copied()
            .find(|id| id.as_i32() >= 0 && !self.suspected.contains(id))
    }
}

impl SuspectRestorer for LeaderDetector {
    fn suspect(&self, id: ReplicaId) {
        self.update_suspicion(id, true);
    }

    fn restore(&self, id: ReplicaId) {
        self.update_suspicion(id, false);
    }
}

pub struct LeaderChangeListener {
    rx: mpsc::UnboundedReceiver<LeaderChange>,
}

impl LeaderChangeListener {
    /// Returns `None` once the detector has been dropped.
    pub async fn next(&mut self) -> Option<LeaderChange> {
        self.rx.recv().await
    }

    #[cfg(test)]
    pub(crate) fn try_next(&mut self) -> Option<LeaderChange> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(ids: &[i32]) -> Vec<ReplicaId> {
        ids.iter().map(|id| ReplicaId::new(*id)).collect()
    }

    fn detector(node_ids: &[i32]) -> LeaderDetector {
        LeaderDetector::new(slog::Logger::root(slog::Discard, slog::o!()), &ids(node_ids))
    }

    fn leader(id: i32) -> Option<LeaderChange> {
        Some(LeaderChange {
            leader: Some(ReplicaId::new(id)),
        })
    }

    #[derive(Clone, Copy)]
    enum Action {
        Suspect(i32),
        Restore(i32),
    }

    #[test]
    fn leader_is_highest_unsuspected_id() {
        use Action::*;

        // -- setup --
        let ld = detector(&[0, 1, 2]);
        let mut listener = ld.subscribe();
        assert_eq!(ld.leader(), Some(ReplicaId::new(2)));

        // (action, expected leader, expected publication)
        let steps = vec![
            (Suspect(2), Some(1), leader(1)),
            (Restore(2), Some(2), leader(2)),
            (Restore(2), Some(2), None),
            (Suspect(1), Some(2), None),
            (Suspect(0), Some(2), None),
            (Suspect(2), None, Some(LeaderChange { leader: None })),
            (Restore(0), Some(0), leader(0)),
            (Restore(1), Some(1), leader(1)),
            (Restore(2), Some(2), leader(2)),
        ];

        // -- execute & verify --
        for (i, (action, expected_leader, expected_publication)) in steps.into_iter().enumerate() {
            match action {
                Suspect(id) => ld.suspect(ReplicaId::new(id)),
                Restore(id) => ld.restore(ReplicaId::new(id)),
            }
            assert_eq!(ld.leader(), expected_leader.map(ReplicaId::new), "step {}", i);
            assert_eq!(listener.try_next(), expected_publication, "step {}", i);
        }
    }

    #[test]
    fn negative_ids_are_never_leader() {
        let ld = detector(&[-3, -1]);
        assert_eq!(ld.leader(), None);

        let ld = detector(&[-1, 0]);
        assert_eq!(ld.leader(), Some(ReplicaId::new(0)));
        ld.suspect(ReplicaId::new(0));
        assert_eq!(ld.leader(), None);
    }

    #[test]
    fn unknown_ids_do_not_change_leader() {
        let ld = detector(&[0, 1, 2]);
        let mut listener = ld.subscribe();

        ld.suspect(ReplicaId::new(7));
        ld.restore(ReplicaId::new(7));

        assert_eq!(ld.leader(), Some(ReplicaId::new(2)));
        assert_eq!(listener.try_next(), None);
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_change() {
        // -- setup --
        let ld = detector(&[0, 1, 2]);
        let mut first = ld.subscribe();
        let mut second = ld.subscribe();

        // -- execute --
        ld.suspect(ReplicaId::new(2));
        let mut late = ld.subscribe();
        ld.suspect(ReplicaId::new(1));

        // -- verify --
        assert_eq!(first.next().await, leader(1));
        assert_eq!(first.next().await, leader(0));
        assert_eq!(second.next().await, leader(1));
        assert_eq!(second.next().await, leader(0));
        assert_eq!(late.next().await, leader(0));
        assert_eq!(late.try_next(), None);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let ld = detector(&[0, 1]);
        let dropped = ld.subscribe();
        let mut kept = ld.subscribe();
        drop(dropped);

        ld.suspect(ReplicaId::new(1));

        assert_eq!(kept.try_next(), leader(0));
        assert_eq!(ld.lock().subscribers.len(), 1);
    }
}
