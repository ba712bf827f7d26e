use crate::replica;
use crate::replica::{
    Accept, ActorExited, ClientHandleError, Heartbeat, Learn, PhaseOneResult, PhaseTwoResult, Prepare, Promise,
    ProposalEpoch, ReplicaId, Response, Value,
};
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Duration;

pub(crate) fn channel(buffer_size: usize) -> (ActorClient, ActorQueue) {
    let (tx, rx) = mpsc::channel(buffer_size);

    (ActorClient { sender: tx }, ActorQueue { receiver: rx })
}

/// Receiving end of the actor's event queue, before a replica has been attached to it.
pub(crate) struct ActorQueue {
    receiver: mpsc::Receiver<Event>,
}

impl ActorQueue {
    pub(crate) fn spawn(self, replica: replica::Replica) {
        let actor = ReplicaActor {
            receiver: self.receiver,
            replica,
        };
        tokio::spawn(actor.run_event_loop());
    }
}

#[derive(Debug)]
pub(crate) enum Event {
    // Acceptor
    Prepare(Prepare, Callback<Option<Promise>>),
    Accept(Accept, Callback<Option<Learn>>),

    // Decided log
    Commit(Learn),
    ClientHandle(Value, oneshot::Sender<Response>),
    DecidedLog(Callback<Vec<Learn>>),

    // Failure detector
    Heartbeat(Heartbeat),

    // Proposer
    LeaderChange(Option<ReplicaId>),
    PhaseOneResult(PhaseOneResult),
    PhaseTwoResult(PhaseTwoResult),
    RetryProposal(ProposalEpoch),
}

#[derive(Debug)]
pub(crate) struct Callback<T: Debug>(oneshot::Sender<T>);

impl<T: Debug> Callback<T> {
    pub(crate) fn send(self, message: T) {
        // Caller may have given up waiting.
        let _ = self.0.send(message);
    }
}

#[derive(Clone)]
pub(crate) struct ActorClient {
    sender: mpsc::Sender<Event>,
}

impl ActorClient {
    pub(crate) fn weak(&self) -> WeakActorClient {
        WeakActorClient {
            sender: self.sender.downgrade(),
        }
    }

    pub(crate) async fn prepare(&self, prepare: Prepare) -> Result<Option<Promise>, ActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Prepare(prepare, Callback(tx))).await?;

        rx.await.map_err(|_| ActorExited)
    }

    pub(crate) async fn accept(&self, accept: Accept) -> Result<Option<Learn>, ActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Accept(accept, Callback(tx))).await?;

        rx.await.map_err(|_| ActorExited)
    }

    pub(crate) async fn commit(&self, learn: Learn) -> Result<(), ActorExited> {
        self.send(Event::Commit(learn)).await
    }

    /// Waits at most `timeout` for `value` to be decided.
    pub(crate) async fn client_handle(&self, value: Value, timeout: Duration) -> Result<Response, ClientHandleError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::ClientHandle(value, tx)).await?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(ClientHandleError::ReplicaExited),
            Err(_) => Err(ClientHandleError::Timeout(timeout)),
        }
    }

    pub(crate) async fn decided_log(&self) -> Result<Vec<Learn>, ActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::DecidedLog(Callback(tx))).await?;

        rx.await.map_err(|_| ActorExited)
    }

    pub(crate) async fn heartbeat(&self, heartbeat: Heartbeat) -> Result<(), ActorExited> {
        self.send(Event::Heartbeat(heartbeat)).await
    }

    pub(crate) async fn leader_change(&self, leader: Option<ReplicaId>) -> Result<(), ActorExited> {
        self.send(Event::LeaderChange(leader)).await
    }

    pub(crate) async fn phase_one_result(&self, result: PhaseOneResult) -> Result<(), ActorExited> {
        self.send(Event::PhaseOneResult(result)).await
    }

    pub(crate) async fn phase_two_result(&self, result: PhaseTwoResult) -> Result<(), ActorExited> {
        self.send(Event::PhaseTwoResult(result)).await
    }

    pub(crate) async fn retry_proposal(&self, epoch: ProposalEpoch) -> Result<(), ActorExited> {
        self.send(Event::RetryProposal(epoch)).await
    }

    async fn send(&self, event: Event) -> Result<(), ActorExited> {
        self.sender.send(event).await.map_err(|_| ActorExited)
    }
}

/// Doesn't keep the actor alive. Held by the replica's own background tasks and servers so that
/// dropping the last `ActorClient` shuts the replica down.
#[derive(Clone)]
pub(crate) struct WeakActorClient {
    sender: mpsc::WeakSender<Event>,
}

impl WeakActorClient {
    pub(crate) fn upgrade(&self) -> Result<ActorClient, ActorExited> {
        self.sender
            .upgrade()
            .map(|sender| ActorClient { sender })
            .ok_or(ActorExited)
    }
}

/// ReplicaActor is replica logic in actor model.
struct ReplicaActor {
    receiver: mpsc::Receiver<Event>,
    replica: replica::Replica,
}

impl ReplicaActor {
    async fn run_event_loop(mut self) {
        self.replica.start();
        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event);
        }
        self.replica.shutdown();
    }

    // This must NOT be async. Any long running work must be spawned on another task and come back
    // as an event to this actor.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Prepare(prepare, callback) => {
                callback.send(self.replica.handle_prepare(prepare));
            }
            Event::Accept(accept, callback) => {
                callback.send(self.replica.handle_accept(accept));
            }
            Event::Commit(learn) => {
                self.replica.handle_commit(learn);
            }
            Event::ClientHandle(value, responder) => {
                self.replica.handle_client_request(value, responder);
            }
            Event::DecidedLog(callback) => {
                callback.send(self.replica.decided_log());
            }
            Event::Heartbeat(heartbeat) => {
                self.replica.handle_heartbeat(heartbeat);
            }
            Event::LeaderChange(leader) => {
                self.replica.handle_leader_change(leader);
            }
            Event::PhaseOneResult(result) => {
                self.replica.handle_phase_one_result(result);
            }
            Event::PhaseTwoResult(result) => {
                self.replica.handle_phase_two_result(result);
            }
            Event::RetryProposal(epoch) => {
                self.replica.handle_retry_proposal(epoch);
            }
        }
    }
}
