use crate::grpc::grpc_paxos_client::GrpcPaxosClient;
use crate::grpc::{ProtoAccept, ProtoHeartbeat, ProtoLearn, ProtoPrepare, ProtoValue};
use crate::replica::{Accept, Heartbeat, Learn, Prepare, Promise, Response, RpcError, Value};
use crate::transport::PaxosNode;
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use tokio::time::Duration;
use tonic::codegen::http::uri;
use tonic::transport::{Channel, Endpoint};

/// gRPC transport to a remote replica. Connects on first use and reconnects on its own.
pub(crate) struct GrpcNode {
    client: GrpcPaxosClient<Channel>,
}

impl GrpcNode {
    /// `rpc_timeout` bounds every call, so it must cover the slowest one (client handle).
    pub(crate) fn connect_lazy(ip: Ipv4Addr, port: u16, rpc_timeout: Duration) -> Result<Self, ConnectError> {
        let url = format!("http://{}:{}", ip, port);
        let channel = Endpoint::from_shared(url)?.timeout(rpc_timeout).connect_lazy()?;

        Ok(GrpcNode {
            client: GrpcPaxosClient::new(channel),
        })
    }
}

#[async_trait::async_trait]
impl PaxosNode for GrpcNode {
    async fn prepare(&self, prepare: Prepare) -> Result<Option<Promise>, RpcError> {
        let reply = self.client.clone().prepare(ProtoPrepare::from(&prepare)).await?;
        Ok(reply.into_inner().into())
    }

    async fn accept(&self, accept: Accept) -> Result<Option<Learn>, RpcError> {
        let reply = self.client.clone().accept(ProtoAccept::from(&accept)).await?;
        Ok(Option::<Learn>::try_from(reply.into_inner())?)
    }

    async fn commit(&self, learn: Learn) -> Result<(), RpcError> {
        self.client.clone().commit(ProtoLearn::from(&learn)).await?;
        Ok(())
    }

    async fn client_handle(&self, value: Value) -> Result<Response, RpcError> {
        let reply = self.client.clone().client_handle(ProtoValue::from(&value)).await?;
        reply.into_inner().into()
    }

    async fn heartbeat(&self, heartbeat: Heartbeat) -> Result<(), RpcError> {
        self.client.clone().heartbeat(ProtoHeartbeat::from(&heartbeat)).await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Invalid peer address: {0}")]
    InvalidUri(#[from] uri::InvalidUri),

    #[error("Failed to set up connection: {0}")]
    Transport(#[from] tonic::transport::Error),
}
