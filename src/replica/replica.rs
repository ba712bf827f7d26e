use crate::actor::WeakActorClient;
use crate::replica::acceptor::Acceptor;
use crate::replica::detector::{FailureDetector, LeaderDetector};
use crate::replica::proposer::Proposer;
use crate::replica::replica_api::{NotAMember, PhaseOneResult, PhaseTwoResult, ProposalEpoch};
use crate::replica::types::{Accept, Heartbeat, Learn, Prepare, Promise, ReplicaId, Response, Slot, Value};
use crate::transport::Configuration;
use rand::Rng;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Duration;

pub(crate) struct ReplicaConfig {
    pub(crate) logger: slog::Logger,
    pub(crate) my_replica_id: ReplicaId,
    pub(crate) configuration: Arc<Configuration>,
    pub(crate) failure_detector: Arc<FailureDetector<LeaderDetector>>,
    pub(crate) initial_leader: Option<ReplicaId>,
    pub(crate) actor_client: WeakActorClient,
    pub(crate) timeouts: ProposerTimeouts,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct ProposerTimeouts {
    pub(crate) prepare_timeout: Duration,
    pub(crate) accept_timeout: Duration,
    pub(crate) retry_delay: Duration,
}

/// A node's Acceptor, Proposer and decided log. Owned by the replica actor, so every method here
/// runs serialized with every other.
pub(crate) struct Replica {
    logger: slog::Logger,
    acceptor: Acceptor,
    proposer: Proposer,
    failure_detector: Arc<FailureDetector<LeaderDetector>>,

    learnt: BTreeMap<Slot, Learn>,
    adu: Slot,
    decided_values: HashSet<Value>,
    client_waiters: HashMap<Value, Vec<oneshot::Sender<Response>>>,

    configuration: Arc<Configuration>,
    actor_client: WeakActorClient,
    timeouts: ProposerTimeouts,
    epoch: ProposalEpoch,
    in_flight: Option<InFlight>,
}

/// Background work the proposer is waiting on: a quorum call, or the backoff before a retry.
struct InFlight {
    epoch: ProposalEpoch,
    task: JoinHandle<()>,
    accept: Option<Accept>,
}

impl Replica {
    pub(crate) fn new(config: ReplicaConfig) -> Result<Self, NotAMember> {
        let node_ids = config.configuration.node_ids();
        let proposer = Proposer::new(
            config.logger.clone(),
            config.my_replica_id,
            &node_ids,
            config.initial_leader,
        )?;

        Ok(Replica {
            acceptor: Acceptor::new(config.logger.clone(), config.my_replica_id),
            proposer,
            failure_detector: config.failure_detector,
            learnt: BTreeMap::new(),
            adu: Slot::NONE,
            decided_values: HashSet::new(),
            client_waiters: HashMap::new(),
            configuration: config.configuration,
            actor_client: config.actor_client,
            timeouts: config.timeouts,
            epoch: ProposalEpoch::initial(),
            in_flight: None,
            logger: config.logger,
        })
    }

    pub(crate) fn start(&mut self) {
        self.failure_detector.start();
        self.drive_proposer();
    }

    pub(crate) fn shutdown(&mut self) {
        self.failure_detector.stop();
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
    }

    pub(crate) fn handle_prepare(&mut self, prepare: Prepare) -> Option<Promise> {
        self.acceptor.handle_prepare(prepare)
    }

    pub(crate) fn handle_accept(&mut self, accept: Accept) -> Option<Learn> {
        self.acceptor.handle_accept(accept)
    }

    pub(crate) fn handle_heartbeat(&self, heartbeat: Heartbeat) {
        self.failure_detector.deliver(heartbeat);
    }

    /// Records a decision. The first decision for a slot wins; later ones carry the same value
    /// anyway. Client waiters are released as the contiguous decided prefix grows.
    pub(crate) fn handle_commit(&mut self, learn: Learn) {
        if learn.slot <= self.adu || self.learnt.contains_key(&learn.slot) {
            return;
        }
        self.proposer.discard_client_request(&learn.val);
        self.learnt.insert(learn.slot, learn);
        self.prune_abandoned_waiters();

        loop {
            let next = self.adu.next();
            let val = match self.learnt.get(&next) {
                Some(learn) => learn.val.clone(),
                None => break,
            };
            self.adu = next;
            slog::debug!(self.logger, "Decided prefix advanced to {:?}", self.adu);
            self.release_waiters(val);
        }

        self.proposer.advance_adu(self.adu);
        self.drive_proposer();
    }

    fn release_waiters(&mut self, val: Value) {
        if val.is_noop {
            return;
        }
        if let Some(waiters) = self.client_waiters.remove(&val) {
            let response = val.to_response();
            for waiter in waiters {
                let _ = waiter.send(response.clone());
            }
        }
        self.decided_values.insert(val);
    }

    /// Registers `responder` for `value` and queues it for proposal. Every replica queues, only the
    /// leader proposes, so the request survives a change of leader.
    pub(crate) fn handle_client_request(&mut self, value: Value, responder: oneshot::Sender<Response>) {
        if self.decided_values.contains(&value) {
            let _ = responder.send(value.to_response());
            return;
        }

        self.prune_abandoned_waiters();
        self.client_waiters.entry(value.clone()).or_default().push(responder);

        let already_decided = self.learnt.range(self.adu.next()..).any(|(_, learn)| learn.val == value);
        let in_flight = self
            .in_flight
            .as_ref()
            .and_then(|in_flight| in_flight.accept.as_ref())
            .map_or(false, |accept| accept.val == value);
        if !already_decided && !in_flight {
            self.proposer.enqueue_client_request(value);
            self.drive_proposer();
        }
    }

    /// Drops waiters whose client gave up, and values nobody waits for anymore.
    fn prune_abandoned_waiters(&mut self) {
        self.client_waiters.retain(|_, waiters| {
            waiters.retain(|waiter| !waiter.is_closed());
            !waiters.is_empty()
        });
    }

    pub(crate) fn decided_log(&self) -> Vec<Learn> {
        self.learnt.range(..=self.adu).map(|(_, learn)| learn.clone()).collect()
    }

    pub(crate) fn handle_leader_change(&mut self, leader: Option<ReplicaId>) {
        if leader == self.proposer.leader() {
            return;
        }

        let abandoned = self.in_flight.take();
        if let Some(in_flight) = &abandoned {
            in_flight.task.abort();
        }

        self.proposer.new_leader(leader);
        if let Some(accept) = abandoned.and_then(|in_flight| in_flight.accept) {
            self.proposer.requeue(accept);
        }

        self.drive_proposer();
    }

    pub(crate) fn handle_phase_one_result(&mut self, result: PhaseOneResult) {
        if self.take_in_flight(result.epoch).is_none() {
            slog::debug!(self.logger, "Dropping result of abandoned phase 1");
            return;
        }

        match result.result {
            Ok(promise) => {
                self.proposer.handle_promise(promise);
                self.drive_proposer();
            }
            Err(e) => {
                slog::warn!(self.logger, "Phase 1 at round {:?} failed: {}", self.proposer.crnd(), e);
                self.proposer.increase_round();
                self.schedule_retry();
            }
        }
    }

    pub(crate) fn handle_phase_two_result(&mut self, result: PhaseTwoResult) {
        if self.take_in_flight(result.epoch).is_none() {
            slog::debug!(self.logger, "Dropping result of abandoned accept for slot {:?}", result.accept.slot);
            return;
        }

        match result.result {
            Ok(learn) => {
                slog::info!(self.logger, "Slot {:?} decided at round {:?}", learn.slot, learn.rnd);
                self.proposer.discard_client_request(&learn.val);
                self.configuration.commit(learn);
                self.drive_proposer();
            }
            Err(e) => {
                slog::warn!(
                    self.logger,
                    "Accept for slot {:?} at round {:?} failed: {}",
                    result.accept.slot,
                    result.accept.rnd,
                    e
                );
                self.proposer.increase_round();
                self.proposer.requeue(result.accept);
                self.schedule_retry();
            }
        }
    }

    pub(crate) fn handle_retry_proposal(&mut self, epoch: ProposalEpoch) {
        if self.take_in_flight(epoch).is_some() {
            self.drive_proposer();
        }
    }

    fn take_in_flight(&mut self, epoch: ProposalEpoch) -> Option<InFlight> {
        match &self.in_flight {
            Some(in_flight) if in_flight.epoch == epoch => self.in_flight.take(),
            _ => None,
        }
    }

    /// Starts the next quorum call, if we are leader and nothing is outstanding.
    fn drive_proposer(&mut self) {
        if self.in_flight.is_some() || !self.proposer.is_leader() {
            return;
        }

        if let Some(prepare) = self.proposer.prepare_msg() {
            self.spawn_phase_one(prepare);
        } else if let Some(accept) = self.proposer.next_accept() {
            self.spawn_phase_two(accept);
        }
    }

    fn spawn_phase_one(&mut self, prepare: Prepare) {
        self.epoch.incr();
        let epoch = self.epoch;
        let configuration = self.configuration.clone();
        let actor_client = self.actor_client.clone();
        let timeout = self.timeouts.prepare_timeout;

        slog::debug!(self.logger, "Starting phase 1: {:?}", prepare);
        let task = tokio::spawn(async move {
            let result = configuration.prepare(prepare, timeout).await;
            if let Ok(actor_client) = actor_client.upgrade() {
                let _ = actor_client.phase_one_result(PhaseOneResult { epoch, result }).await;
            }
        });

        self.in_flight = Some(InFlight {
            epoch,
            task,
            accept: None,
        });
    }

    fn spawn_phase_two(&mut self, accept: Accept) {
        self.epoch.incr();
        let epoch = self.epoch;
        let configuration = self.configuration.clone();
        let actor_client = self.actor_client.clone();
        let timeout = self.timeouts.accept_timeout;
        let proposal = accept.clone();

        slog::debug!(self.logger, "Proposing {:?}", accept);
        let task = tokio::spawn(async move {
            let result = configuration.accept(proposal.clone(), timeout).await;
            if let Ok(actor_client) = actor_client.upgrade() {
                let _ = actor_client
                    .phase_two_result(PhaseTwoResult {
                        epoch,
                        accept: proposal,
                        result,
                    })
                    .await;
            }
        });

        self.in_flight = Some(InFlight {
            epoch,
            task,
            accept: Some(accept),
        });
    }

    /// Backs off before the next attempt. Jitter keeps competing proposers from retrying in lockstep.
    fn schedule_retry(&mut self) {
        self.epoch.incr();
        let epoch = self.epoch;
        let actor_client = self.actor_client.clone();
        let base = self.timeouts.retry_delay;
        let jitter = rand::thread_rng().gen_range(0..=base.as_millis() as u64 / 2);
        let delay = base + Duration::from_millis(jitter);

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Ok(actor_client) = actor_client.upgrade() {
                let _ = actor_client.retry_proposal(epoch).await;
            }
        });

        self.in_flight = Some(InFlight {
            epoch,
            task,
            accept: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor;
    use crate::replica::replica_api::QuorumCallError;
    use crate::replica::types::{PValue, Round};
    use crate::transport::{LocalNode, NetworkSwitch, PaxosNode};

    struct TestReplica {
        replica: Replica,
        // Keeps the weak actor client upgradable.
        _actor_client: actor::ActorClient,
    }

    /// Replica 0 in a 3 node cluster whose network is switched off, so every quorum call fails
    /// without reaching anyone.
    fn test_replica(leader: i32) -> TestReplica {
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let (actor_client, _queue) = actor::channel(10);
        let node_ids = [ReplicaId::new(0), ReplicaId::new(1), ReplicaId::new(2)];
        let switch = NetworkSwitch::new();
        switch.set_connected(false);
        let nodes = node_ids
            .iter()
            .map(|id| {
                let node: Arc<dyn PaxosNode> = Arc::new(LocalNode::new(
                    actor_client.weak(),
                    switch.clone(),
                    switch.clone(),
                    Duration::from_millis(100),
                ));
                (*id, node)
            })
            .collect();
        let configuration = Arc::new(Configuration::new(logger.clone(), nodes));
        let leader_detector = LeaderDetector::new(logger.clone(), &node_ids);
        let failure_detector = Arc::new(FailureDetector::new(
            logger.clone(),
            ReplicaId::new(0),
            &node_ids,
            Duration::from_secs(1),
            Duration::from_secs(1),
            leader_detector,
            configuration.clone(),
        ));

        let replica = Replica::new(ReplicaConfig {
            logger,
            my_replica_id: ReplicaId::new(0),
            configuration,
            failure_detector,
            initial_leader: Some(ReplicaId::new(leader)),
            actor_client: actor_client.weak(),
            timeouts: ProposerTimeouts {
                prepare_timeout: Duration::from_millis(100),
                accept_timeout: Duration::from_millis(100),
                retry_delay: Duration::from_millis(100),
            },
        })
        .unwrap();

        TestReplica {
            replica,
            _actor_client: actor_client,
        }
    }

    /// Never leader, so nothing gets proposed.
    fn follower_replica() -> TestReplica {
        test_replica(2)
    }

    fn learn(slot: u32, val: &Value) -> Learn {
        Learn {
            from: ReplicaId::new(2),
            slot: Slot::new(slot),
            rnd: Round::new(2),
            val: val.clone(),
        }
    }

    fn slots(log: &[Learn]) -> Vec<u32> {
        log.iter().map(|learn| learn.slot.as_u32()).collect()
    }

    #[tokio::test]
    async fn decided_prefix_only_grows_contiguously() {
        let mut test = follower_replica();
        let replica = &mut test.replica;
        let a = Value::new("a", 1, "a");

        replica.handle_commit(learn(2, &a));
        replica.handle_commit(learn(3, &a));
        assert!(replica.decided_log().is_empty());

        replica.handle_commit(learn(1, &a));
        assert_eq!(slots(&replica.decided_log()), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn first_decision_for_a_slot_wins() {
        let mut test = follower_replica();
        let replica = &mut test.replica;
        let a = Value::new("a", 1, "a");
        let b = Value::new("b", 1, "b");

        replica.handle_commit(learn(2, &a));
        replica.handle_commit(learn(2, &b));
        replica.handle_commit(learn(1, &b));
        replica.handle_commit(learn(1, &a));

        let log = replica.decided_log();
        assert_eq!(log[0].val, b);
        assert_eq!(log[1].val, a);
    }

    #[tokio::test]
    async fn waiters_are_released_only_by_their_own_value() {
        let mut test = follower_replica();
        let replica = &mut test.replica;
        let a = Value::new("client", 1, "a");
        let b = Value::new("client", 2, "b");
        let (a_tx, mut a_rx) = oneshot::channel();
        let (b_tx, mut b_rx) = oneshot::channel();

        replica.handle_client_request(a.clone(), a_tx);
        replica.handle_client_request(b.clone(), b_tx);

        // Decided, but not yet part of the contiguous prefix.
        replica.handle_commit(learn(2, &b));
        assert!(b_rx.try_recv().is_err());

        replica.handle_commit(learn(1, &Value::noop()));
        assert_eq!(b_rx.try_recv().unwrap(), b.to_response());
        assert!(a_rx.try_recv().is_err());

        replica.handle_commit(learn(3, &a));
        assert_eq!(a_rx.try_recv().unwrap(), a.to_response());
    }

    #[tokio::test]
    async fn request_for_decided_value_is_answered_immediately() {
        let mut test = follower_replica();
        let replica = &mut test.replica;
        let a = Value::new("client", 1, "a");
        replica.handle_commit(learn(1, &a));

        let (tx, mut rx) = oneshot::channel();
        replica.handle_client_request(a.clone(), tx);

        assert_eq!(rx.try_recv().unwrap(), a.to_response());
    }

    #[tokio::test]
    async fn concurrent_identical_requests_are_all_answered() {
        let mut test = follower_replica();
        let replica = &mut test.replica;
        let a = Value::new("client", 1, "a");
        let (first_tx, mut first_rx) = oneshot::channel();
        let (second_tx, mut second_rx) = oneshot::channel();

        replica.handle_client_request(a.clone(), first_tx);
        replica.handle_client_request(a.clone(), second_tx);
        replica.handle_commit(learn(1, &a));

        assert_eq!(first_rx.try_recv().unwrap(), a.to_response());
        assert_eq!(second_rx.try_recv().unwrap(), a.to_response());
    }

    #[tokio::test]
    async fn waiters_of_clients_that_gave_up_are_dropped() {
        let mut test = follower_replica();
        let replica = &mut test.replica;
        let a = Value::new("client", 1, "a");
        let b = Value::new("client", 2, "b");
        let (a_tx, a_rx) = oneshot::channel();
        let (b_tx, _b_rx) = oneshot::channel();

        replica.handle_client_request(a.clone(), a_tx);
        drop(a_rx);
        replica.handle_client_request(b.clone(), b_tx);

        assert!(!replica.client_waiters.contains_key(&a));
        assert_eq!(replica.client_waiters.get(&b).map(Vec::len), Some(1));
    }

    fn accept_in_flight(replica: &Replica) -> (ProposalEpoch, Accept) {
        let in_flight = replica.in_flight.as_ref().unwrap();
        (in_flight.epoch, in_flight.accept.clone().unwrap())
    }

    fn decided(accept: &Accept) -> Learn {
        Learn {
            from: accept.from,
            slot: accept.slot,
            rnd: accept.rnd,
            val: accept.val.clone(),
        }
    }

    fn merged_promise(replica: &Replica, accepted: Vec<PValue>) -> Promise {
        Promise {
            to: ReplicaId::new(0),
            from: ReplicaId::new(0),
            rnd: replica.proposer.crnd(),
            accepted,
        }
    }

    #[tokio::test]
    async fn retried_request_is_not_proposed_while_its_accept_is_in_flight() {
        // -- setup --
        let mut test = test_replica(0);
        let replica = &mut test.replica;
        let v = Value::new("client", 1, "put k v");
        let (first_tx, _first_rx) = oneshot::channel();
        let (retry_tx, _retry_rx) = oneshot::channel();
        let promise = merged_promise(replica, vec![]);
        replica.proposer.handle_promise(promise);

        // -- execute --
        replica.handle_client_request(v.clone(), first_tx);
        let (epoch, accept) = accept_in_flight(replica);
        replica.handle_client_request(v.clone(), retry_tx);
        replica.handle_phase_two_result(PhaseTwoResult {
            epoch,
            accept: accept.clone(),
            result: Ok(decided(&accept)),
        });

        // -- verify --
        assert_eq!((accept.slot, accept.val), (Slot::new(1), v));
        assert_eq!(replica.proposer.client_queue_len(), 0);
        assert!(replica.in_flight.is_none(), "decided value was proposed again");
    }

    #[tokio::test]
    async fn timed_out_accept_is_retried_at_its_slot_after_new_phase_one() {
        // -- setup --
        let mut test = test_replica(0);
        let replica = &mut test.replica;
        let v = Value::new("client", 1, "put k v");
        let (tx, _rx) = oneshot::channel();
        let promise = merged_promise(replica, vec![]);
        replica.proposer.handle_promise(promise);
        replica.handle_client_request(v.clone(), tx);
        let (epoch, timed_out) = accept_in_flight(replica);

        // -- execute --
        replica.handle_phase_two_result(PhaseTwoResult {
            epoch,
            accept: timed_out.clone(),
            result: Err(QuorumCallError::QuorumTimeout { replies: 1, quorum: 2 }),
        });
        let retry_epoch = replica.in_flight.as_ref().unwrap().epoch;
        replica.handle_retry_proposal(retry_epoch);
        let phase_one_epoch = replica.in_flight.as_ref().unwrap().epoch;
        // One acceptor did vote for the timed out proposal.
        let promise = merged_promise(
            replica,
            vec![PValue {
                slot: timed_out.slot,
                vrnd: timed_out.rnd,
                vval: v.clone(),
            }],
        );
        replica.handle_phase_one_result(PhaseOneResult {
            epoch: phase_one_epoch,
            result: Ok(promise),
        });
        let (epoch, retried) = accept_in_flight(replica);
        replica.handle_phase_two_result(PhaseTwoResult {
            epoch,
            accept: retried.clone(),
            result: Ok(decided(&retried)),
        });

        // -- verify --
        assert_eq!(retried.slot, timed_out.slot);
        assert!(retried.rnd > timed_out.rnd);
        assert_eq!(retried.val, v);
        assert_eq!(replica.proposer.client_queue_len(), 0);
        assert!(replica.in_flight.is_none(), "value was proposed in a second slot");
    }
}
