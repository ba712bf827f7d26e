use crate::replica::{
    Accept, Heartbeat, HeartbeatSender, Learn, PaxosQuorumSpec, Prepare, Promise, QuorumCallError, ReplicaId,
    Response, RpcError, Value,
};
use crate::transport::PaxosNode;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

/// Every node of the cluster, including ourselves, plus the quorum functions for its size.
pub(crate) struct Configuration {
    logger: slog::Logger,
    nodes: Vec<(ReplicaId, Arc<dyn PaxosNode>)>,
    quorum_spec: PaxosQuorumSpec,
}

impl Configuration {
    pub(crate) fn new(logger: slog::Logger, nodes: Vec<(ReplicaId, Arc<dyn PaxosNode>)>) -> Self {
        let quorum_spec = PaxosQuorumSpec::new(nodes.len());

        Configuration {
            logger,
            nodes,
            quorum_spec,
        }
    }

    pub(crate) fn node_ids(&self) -> Vec<ReplicaId> {
        self.nodes.iter().map(|(id, _)| *id).collect()
    }

    pub(crate) async fn prepare(&self, prepare: Prepare, timeout: Duration) -> Result<Promise, QuorumCallError> {
        let quorum_spec = self.quorum_spec;
        let probe = prepare.clone();
        self.quorum_call(prepare, timeout, move |replies| quorum_spec.prepare_qf(&probe, replies))
            .await
    }

    pub(crate) async fn accept(&self, accept: Accept, timeout: Duration) -> Result<Learn, QuorumCallError> {
        let quorum_spec = self.quorum_spec;
        let proposal = accept.clone();
        self.quorum_call(accept, timeout, move |replies| quorum_spec.accept_qf(&proposal, replies))
            .await
    }

    pub(crate) async fn client_handle(&self, value: Value, timeout: Duration) -> Result<Response, QuorumCallError> {
        let quorum_spec = self.quorum_spec;
        let request = value.clone();
        self.quorum_call(value, timeout, move |replies| quorum_spec.client_handle_qf(&request, replies))
            .await
    }

    /// Fire-and-forget to every node.
    pub(crate) fn commit(&self, learn: Learn) {
        for (id, node) in self.nodes.iter() {
            let id = *id;
            let node = node.clone();
            let learn = learn.clone();
            let logger = self.logger.clone();
            tokio::spawn(async move {
                if let Err(e) = node.commit(learn).await {
                    slog::debug!(logger, "Commit to {:?} failed: {}", id, e);
                }
            });
        }
    }

    /// Sends to every node concurrently and feeds replies to `quorum_fn` as they arrive. Returns as
    /// soon as it reports a quorum. Replies arriving after return are dropped.
    async fn quorum_call<R, Q>(&self, request: R, timeout: Duration, quorum_fn: Q) -> Result<R::Reply, QuorumCallError>
    where
        R: QuorumRpc,
        Q: Fn(&HashMap<ReplicaId, R::Reply>) -> Option<R::Reply>,
    {
        let deadline = Instant::now() + timeout;
        let (tx, mut rx) = mpsc::channel(self.nodes.len().max(1));

        for (id, node) in self.nodes.iter() {
            let id = *id;
            let node = node.clone();
            let request = request.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = request.call(node.as_ref()).await;
                let _ = tx.send((id, result)).await;
            });
        }
        drop(tx);

        let mut replies = HashMap::new();
        loop {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some((id, Ok(Some(reply))))) => {
                    replies.insert(id, reply);
                    if let Some(combined) = quorum_fn(&replies) {
                        return Ok(combined);
                    }
                }
                Ok(Some((_, Ok(None)))) => {}
                Ok(Some((id, Err(e)))) => {
                    slog::debug!(self.logger, "Rpc to {:?} failed: {}", id, e);
                }
                Ok(None) => {
                    return Err(QuorumCallError::QuorumUnreachable {
                        replies: replies.len(),
                        quorum: self.quorum_spec.quorum(),
                    });
                }
                Err(_) => {
                    return Err(QuorumCallError::QuorumTimeout {
                        replies: replies.len(),
                        quorum: self.quorum_spec.quorum(),
                    });
                }
            }
        }
    }
}

impl HeartbeatSender for Configuration {
    fn send_heartbeat(&self, heartbeat: Heartbeat) {
        let node = match self.nodes.iter().find(|(id, _)| *id == heartbeat.to) {
            Some((_, node)) => node.clone(),
            None => {
                slog::warn!(self.logger, "Heartbeat for unknown node {:?}", heartbeat.to);
                return;
            }
        };

        tokio::spawn(async move {
            // Lost heartbeats are exactly what the failure detector is there to notice.
            let _ = node.heartbeat(heartbeat).await;
        });
    }
}

/// A request that can be fanned out by a quorum call.
#[async_trait::async_trait]
trait QuorumRpc: Clone + Send + Sync + 'static {
    type Reply: Send + 'static;

    async fn call(&self, node: &dyn PaxosNode) -> Result<Option<Self::Reply>, RpcError>;
}

#[async_trait::async_trait]
impl QuorumRpc for Prepare {
    type Reply = Promise;

    async fn call(&self, node: &dyn PaxosNode) -> Result<Option<Promise>, RpcError> {
        node.prepare(self.clone()).await
    }
}

#[async_trait::async_trait]
impl QuorumRpc for Accept {
    type Reply = Learn;

    async fn call(&self, node: &dyn PaxosNode) -> Result<Option<Learn>, RpcError> {
        node.accept(self.clone()).await
    }
}

#[async_trait::async_trait]
impl QuorumRpc for Value {
    type Reply = Response;

    async fn call(&self, node: &dyn PaxosNode) -> Result<Option<Response>, RpcError> {
        node.client_handle(self.clone()).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replica::{Round, Slot};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers accepts with a canned learn after a delay, or never.
    struct FakeNode {
        id: ReplicaId,
        delay: Option<Duration>,
        vote_for: Value,
        commits: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl PaxosNode for FakeNode {
        async fn prepare(&self, _: Prepare) -> Result<Option<Promise>, RpcError> {
            Ok(None)
        }

        async fn accept(&self, accept: Accept) -> Result<Option<Learn>, RpcError> {
            match self.delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending::<()>().await,
            }
            Ok(Some(Learn {
                from: self.id,
                slot: accept.slot,
                rnd: accept.rnd,
                val: self.vote_for.clone(),
            }))
        }

        async fn commit(&self, _: Learn) -> Result<(), RpcError> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn client_handle(&self, _: Value) -> Result<Response, RpcError> {
            Err(RpcError::Unreachable("fake".into()))
        }

        async fn heartbeat(&self, _: Heartbeat) -> Result<(), RpcError> {
            Ok(())
        }
    }

    fn configuration(nodes: Vec<(Option<Duration>, Value)>, commits: Arc<AtomicUsize>) -> Configuration {
        let nodes = nodes
            .into_iter()
            .enumerate()
            .map(|(i, (delay, vote_for))| {
                let id = ReplicaId::new(i as i32);
                let node: Arc<dyn PaxosNode> = Arc::new(FakeNode {
                    id,
                    delay,
                    vote_for,
                    commits: commits.clone(),
                });
                (id, node)
            })
            .collect();

        Configuration::new(slog::Logger::root(slog::Discard, slog::o!()), nodes)
    }

    fn accept(val: &Value) -> Accept {
        Accept {
            from: ReplicaId::new(0),
            slot: Slot::new(1),
            rnd: Round::new(0),
            val: val.clone(),
        }
    }

    #[tokio::test]
    async fn accept_returns_as_soon_as_quorum_agrees() {
        let x = Value::new("c", 1, "ls");
        let fast = Some(Duration::from_millis(1));
        let config = configuration(
            vec![(fast, x.clone()), (fast, x.clone()), (None, x.clone())],
            Arc::new(AtomicUsize::new(0)),
        );

        let decided = config.accept(accept(&x), Duration::from_secs(5)).await.unwrap();

        assert_eq!(decided.val, x);
        assert_eq!(decided.slot, Slot::new(1));
    }

    #[tokio::test]
    async fn accept_times_out_without_quorum() {
        let x = Value::new("c", 1, "ls");
        let config = configuration(
            vec![(Some(Duration::from_millis(1)), x.clone()), (None, x.clone()), (None, x.clone())],
            Arc::new(AtomicUsize::new(0)),
        );

        let result = config.accept(accept(&x), Duration::from_millis(50)).await;

        assert_eq!(
            result,
            Err(QuorumCallError::QuorumTimeout {
                replies: 1,
                quorum: 2
            })
        );
    }

    #[tokio::test]
    async fn accept_fails_fast_when_everyone_answered_without_quorum() {
        let x = Value::new("c", 1, "ls");
        let y = Value::new("c", 2, "rm");
        let fast = Some(Duration::from_millis(1));
        let config = configuration(
            vec![(fast, x.clone()), (fast, y.clone()), (fast, y.clone())],
            Arc::new(AtomicUsize::new(0)),
        );

        let result = config.accept(accept(&x), Duration::from_secs(5)).await;

        assert_eq!(
            result,
            Err(QuorumCallError::QuorumUnreachable {
                replies: 3,
                quorum: 2
            })
        );
    }

    #[tokio::test]
    async fn commit_reaches_every_node() {
        let commits = Arc::new(AtomicUsize::new(0));
        let x = Value::new("c", 1, "ls");
        let config = configuration(vec![(None, x.clone()), (None, x.clone()), (None, x.clone())], commits.clone());

        config.commit(Learn {
            from: ReplicaId::new(0),
            slot: Slot::new(1),
            rnd: Round::new(0),
            val: x,
        });

        for _ in 0..100 {
            if commits.load(Ordering::SeqCst) == 3 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Expected 3 commits, saw {}", commits.load(Ordering::SeqCst));
    }
}
