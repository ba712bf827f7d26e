use crate::replica::{Accept, Heartbeat, Learn, Prepare, Promise, Response, RpcError, Value};

/// Unicast RPCs to a single node. `None` replies mean the node deliberately ignored a stale
/// message, which is not an error.
#[async_trait::async_trait]
pub(crate) trait PaxosNode: Send + Sync + 'static {
    async fn prepare(&self, prepare: Prepare) -> Result<Option<Promise>, RpcError>;

    async fn accept(&self, accept: Accept) -> Result<Option<Learn>, RpcError>;

    async fn commit(&self, learn: Learn) -> Result<(), RpcError>;

    /// Resolves once the node has seen `value` decided.
    async fn client_handle(&self, value: Value) -> Result<Response, RpcError>;

    async fn heartbeat(&self, heartbeat: Heartbeat) -> Result<(), RpcError>;
}
