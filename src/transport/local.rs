use crate::actor::WeakActorClient;
use crate::replica::{Accept, Heartbeat, Learn, Prepare, Promise, Response, RpcError, Value};
use crate::transport::PaxosNode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::Duration;

/// Connects a node to the in-process network. Turning it off drops everything it sends and
/// everything sent to it, which looks like a crash to the rest of the cluster.
#[derive(Clone)]
pub(crate) struct NetworkSwitch {
    connected: Arc<AtomicBool>,
}

impl NetworkSwitch {
    pub(crate) fn new() -> Self {
        NetworkSwitch {
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// In-process transport to a replica actor.
pub(crate) struct LocalNode {
    target: WeakActorClient,
    target_switch: NetworkSwitch,
    source_switch: NetworkSwitch,
    client_handle_timeout: Duration,
}

impl LocalNode {
    pub(crate) fn new(
        target: WeakActorClient,
        target_switch: NetworkSwitch,
        source_switch: NetworkSwitch,
        client_handle_timeout: Duration,
    ) -> Self {
        LocalNode {
            target,
            target_switch,
            source_switch,
            client_handle_timeout,
        }
    }

    fn check_link(&self) -> Result<(), RpcError> {
        if self.source_switch.is_connected() && self.target_switch.is_connected() {
            Ok(())
        } else {
            Err(RpcError::Unreachable("network switch is off".into()))
        }
    }
}

#[async_trait::async_trait]
impl PaxosNode for LocalNode {
    async fn prepare(&self, prepare: Prepare) -> Result<Option<Promise>, RpcError> {
        self.check_link()?;
        let promise = self.target.upgrade()?.prepare(prepare).await?;
        self.check_link()?;
        Ok(promise)
    }

    async fn accept(&self, accept: Accept) -> Result<Option<Learn>, RpcError> {
        self.check_link()?;
        let learn = self.target.upgrade()?.accept(accept).await?;
        self.check_link()?;
        Ok(learn)
    }

    async fn commit(&self, learn: Learn) -> Result<(), RpcError> {
        self.check_link()?;
        Ok(self.target.upgrade()?.commit(learn).await?)
    }

    async fn client_handle(&self, value: Value) -> Result<Response, RpcError> {
        self.check_link()?;
        let response = self
            .target
            .upgrade()?
            .client_handle(value, self.client_handle_timeout)
            .await
            .map_err(|e| RpcError::ServerFault(e.to_string()))?;
        self.check_link()?;
        Ok(response)
    }

    async fn heartbeat(&self, heartbeat: Heartbeat) -> Result<(), RpcError> {
        self.check_link()?;
        Ok(self.target.upgrade()?.heartbeat(heartbeat).await?)
    }
}
