use crate::api::types::PaxosMemberInfo;
use crate::replica::{QuorumCallError, Response, Value};
use crate::transport::{ConnectError, Configuration, GrpcNode, PaxosNode};
use std::sync::Arc;
use tokio::time::Duration;

/// Submits values to every member of a cluster and waits for a quorum of matching responses.
pub struct PaxosClient {
    configuration: Arc<Configuration>,
    timeout: Duration,
}

impl PaxosClient {
    pub fn connect(
        members: &[PaxosMemberInfo],
        timeout: Duration,
        logger: slog::Logger,
    ) -> Result<PaxosClient, ConnectError> {
        let mut nodes = Vec::with_capacity(members.len());
        for member in members {
            let node: Arc<dyn PaxosNode> = Arc::new(GrpcNode::connect_lazy(member.ip_addr, member.rpc_port, timeout)?);
            nodes.push((member.id(), node));
        }

        Ok(PaxosClient::new(Arc::new(Configuration::new(logger, nodes)), timeout))
    }

    pub(crate) fn new(configuration: Arc<Configuration>, timeout: Duration) -> Self {
        PaxosClient { configuration, timeout }
    }

    /// Resolves once a quorum of replicas answered with the same response for `value`.
    pub async fn client_handle(&self, value: Value) -> Result<Response, QuorumCallError> {
        self.configuration.client_handle(value, self.timeout).await
    }
}
