use crate::replica::detector::time::{Clock, RealClock};
use crate::replica::detector::SuspectRestorer;
use crate::replica::types::{Heartbeat, HeartbeatKind, ReplicaId};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Duration;

/// Outbound side of the heartbeat exchange. Sends must not block the detector loop.
pub(crate) trait HeartbeatSender: Send + Sync + 'static {
    fn send_heartbeat(&self, heartbeat: Heartbeat);
}

/// Eventually perfect failure detector with an adaptive timeout. Every round it asks all nodes for
/// a heartbeat, suspects whoever stayed silent during the previous round, and restores whoever was
/// wrongly suspected. Each round with a false suspicion makes the next round `delta` longer.
pub(crate) struct FailureDetector<S: SuspectRestorer + Clone, C: Clock = RealClock> {
    logger: slog::Logger,
    my_replica_id: ReplicaId,
    state: Arc<Mutex<FailureDetectorState>>,
    suspect_restorer: S,
    heartbeat_sender: Arc<dyn HeartbeatSender>,
    clock: C,
    inbox_tx: mpsc::UnboundedSender<Heartbeat>,
    inbox_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Heartbeat>>>,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl<S: SuspectRestorer + Clone> FailureDetector<S, RealClock> {
    pub(crate) fn new(
        logger: slog::Logger,
        my_replica_id: ReplicaId,
        node_ids: &[ReplicaId],
        delay: Duration,
        delta: Duration,
        suspect_restorer: S,
        heartbeat_sender: Arc<dyn HeartbeatSender>,
    ) -> Self {
        Self::with_clock(
            logger,
            my_replica_id,
            node_ids,
            delay,
            delta,
            suspect_restorer,
            heartbeat_sender,
            RealClock,
        )
    }
}

impl<S: SuspectRestorer + Clone, C: Clock> FailureDetector<S, C> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn with_clock(
        logger: slog::Logger,
        my_replica_id: ReplicaId,
        node_ids: &[ReplicaId],
        delay: Duration,
        delta: Duration,
        suspect_restorer: S,
        heartbeat_sender: Arc<dyn HeartbeatSender>,
        clock: C,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        FailureDetector {
            logger,
            my_replica_id,
            state: Arc::new(Mutex::new(FailureDetectorState::new(
                my_replica_id,
                node_ids,
                delay,
                delta,
            ))),
            suspect_restorer,
            heartbeat_sender,
            clock,
            inbox_tx,
            inbox_rx: Arc::new(tokio::sync::Mutex::new(inbox_rx)),
            stop_tx: Mutex::new(None),
        }
    }

    /// Launches the detector loop. No-op if it is already running.
    pub(crate) fn start(&self) {
        let mut stop_tx = lock(&self.stop_tx);
        if stop_tx.is_some() {
            slog::debug!(self.logger, "Failure detector already running");
            return;
        }

        let (tx, rx) = oneshot::channel();
        *stop_tx = Some(tx);

        let task = FailureDetectorTask {
            logger: self.logger.clone(),
            state: self.state.clone(),
            suspect_restorer: self.suspect_restorer.clone(),
            heartbeat_sender: self.heartbeat_sender.clone(),
            clock: self.clock.clone(),
        };
        tokio::spawn(task.run(self.inbox_rx.clone(), rx));
    }

    /// Stops the detector loop. No-op if it is not running.
    pub(crate) fn stop(&self) {
        if let Some(tx) = lock(&self.stop_tx).take() {
            let _ = tx.send(());
        }
    }

    fn is_running(&self) -> bool {
        lock(&self.stop_tx).is_some()
    }

    /// Inbound heartbeat from the transport. Dropped while the loop is stopped.
    pub(crate) fn deliver(&self, heartbeat: Heartbeat) {
        if heartbeat.to != self.my_replica_id {
            slog::warn!(self.logger, "Dropping heartbeat addressed to someone else: {:?}", heartbeat);
            return;
        }
        if !self.is_running() {
            return;
        }
        let _ = self.inbox_tx.send(heartbeat);
    }

    #[cfg(test)]
    pub(crate) fn delay(&self) -> Duration {
        lock(&self.state).delay
    }
}

impl<S: SuspectRestorer + Clone, C: Clock> Drop for FailureDetector<S, C> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

enum Step {
    Stop,
    Heartbeat(Option<Heartbeat>),
    Timeout,
}

struct FailureDetectorTask<S, C> {
    logger: slog::Logger,
    state: Arc<Mutex<FailureDetectorState>>,
    suspect_restorer: S,
    heartbeat_sender: Arc<dyn HeartbeatSender>,
    clock: C,
}

impl<S: SuspectRestorer, C: Clock> FailureDetectorTask<S, C> {
    async fn run(
        mut self,
        inbox: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Heartbeat>>>,
        mut stop_rx: oneshot::Receiver<()>,
    ) {
        // A previous incarnation of the loop may still be releasing the inbox.
        let mut inbox = inbox.lock_owned().await;
        let mut wake_time = self.clock.now() + lock(&self.state).delay;

        loop {
            let step = tokio::select! {
                biased;
                _ = &mut stop_rx => Step::Stop,
                heartbeat = inbox.recv() => Step::Heartbeat(heartbeat),
                _ = self.clock.sleep_until(wake_time) => Step::Timeout,
            };

            match step {
                Step::Stop | Step::Heartbeat(None) => {
                    slog::debug!(self.logger, "Failure detector loop exiting");
                    return;
                }
                Step::Heartbeat(Some(heartbeat)) => self.handle_heartbeat(heartbeat),
                Step::Timeout => {
                    let delay = self.timeout();
                    wake_time = self.clock.now() + delay;
                }
            }
        }
    }

    fn handle_heartbeat(&self, heartbeat: Heartbeat) {
        let reply = lock(&self.state).handle_heartbeat(heartbeat);
        if let Some(reply) = reply {
            self.heartbeat_sender.send_heartbeat(reply);
        }
    }

    fn timeout(&self) -> Duration {
        let outcome = lock(&self.state).timeout();

        for request in outcome.requests {
            self.heartbeat_sender.send_heartbeat(request);
        }
        for id in outcome.suspected {
            slog::info!(self.logger, "Suspecting replica {:?}", id);
            self.suspect_restorer.suspect(id);
        }
        for id in outcome.restored {
            slog::info!(self.logger, "Restoring replica {:?}, next delay {:?}", id, outcome.delay);
            self.suspect_restorer.restore(id);
        }

        outcome.delay
    }
}

struct FailureDetectorState {
    my_replica_id: ReplicaId,
    node_ids: Vec<ReplicaId>,
    alive: HashSet<ReplicaId>,
    suspected: HashSet<ReplicaId>,
    delay: Duration,
    delta: Duration,
}

struct RoundOutcome {
    requests: Vec<Heartbeat>,
    suspected: Vec<ReplicaId>,
    restored: Vec<ReplicaId>,
    delay: Duration,
}

impl FailureDetectorState {
    fn new(my_replica_id: ReplicaId, node_ids: &[ReplicaId], delay: Duration, delta: Duration) -> Self {
        FailureDetectorState {
            my_replica_id,
            node_ids: node_ids.to_vec(),
            // Everyone starts out alive so the first round doesn't suspect the whole cluster.
            alive: node_ids.iter().copied().collect(),
            suspected: HashSet::new(),
            delay,
            delta,
        }
    }

    fn handle_heartbeat(&mut self, heartbeat: Heartbeat) -> Option<Heartbeat> {
        match heartbeat.kind {
            HeartbeatKind::Request => Some(Heartbeat {
                from: self.my_replica_id,
                to: heartbeat.from,
                kind: HeartbeatKind::Reply,
            }),
            HeartbeatKind::Reply => {
                self.alive.insert(heartbeat.from);
                None
            }
        }
    }

    fn timeout(&mut self) -> RoundOutcome {
        let requests = self
            .node_ids
            .iter()
            .map(|id| Heartbeat {
                from: self.my_replica_id,
                to: *id,
                kind: HeartbeatKind::Request,
            })
            .collect();

        let mut suspected = Vec::new();
        let mut restored = Vec::new();
        for id in self.node_ids.iter().copied() {
            let alive = self.alive.contains(&id);
            if !alive && self.suspected.insert(id) {
                suspected.push(id);
            }
            if alive && self.suspected.remove(&id) {
                restored.push(id);
            }
        }

        if !restored.is_empty() {
            self.delay += self.delta;
        }
        self.alive.clear();

        RoundOutcome {
            requests,
            suspected,
            restored,
            delay: self.delay,
        }
    }
}
