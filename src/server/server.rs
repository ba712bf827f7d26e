use crate::actor::{ActorClient, WeakActorClient};
use crate::grpc::grpc_paxos_server::{GrpcPaxos, GrpcPaxosServer};
use crate::grpc::{
    ProtoAccept, ProtoEmpty, ProtoHeartbeat, ProtoLearn, ProtoLearnResult, ProtoPrepare, ProtoPromiseResult,
    ProtoResponseResult, ProtoValue,
};
use crate::replica::{Accept, ClientHandleError, Heartbeat, Learn, Prepare, Value};
use crate::server::RpcServerShutdownSignal;
use std::convert::TryFrom;
use std::net::SocketAddr;
use tokio::time::Duration;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// RpcServer is the type that implements the Paxos gRPC interface.
pub(crate) struct RpcServer {
    logger: slog::Logger,
    local_replica: WeakActorClient,
    client_handle_timeout: Duration,
}

impl RpcServer {
    pub(crate) fn new(logger: slog::Logger, local_replica: WeakActorClient, client_handle_timeout: Duration) -> Self {
        RpcServer {
            logger,
            local_replica,
            client_handle_timeout,
        }
    }

    pub(crate) async fn run(self, socket_addr: SocketAddr, shutdown_signal: RpcServerShutdownSignal) {
        let logger = self.logger.clone();
        slog::info!(logger, "Listening on '{:?}'", socket_addr);

        let result = Server::builder()
            .add_service(GrpcPaxosServer::new(self))
            .serve_with_shutdown(socket_addr, shutdown_signal.wait())
            .await;

        slog::info!(logger, "Server run() has exited: {:?}", result);
    }

    fn local_replica(&self) -> Result<ActorClient, Status> {
        self.local_replica
            .upgrade()
            .map_err(|e| Status::unavailable(e.to_string()))
    }

    async fn handle_prepare(&self, rpc_request: ProtoPrepare) -> Result<ProtoPromiseResult, Status> {
        let prepare = Prepare::from(rpc_request);
        let promise = self
            .local_replica()?
            .prepare(prepare)
            .await
            .map_err(|e| Status::unavailable(e.to_string()))?;

        Ok(promise.into())
    }

    async fn handle_accept(&self, rpc_request: ProtoAccept) -> Result<ProtoLearnResult, Status> {
        let accept = Accept::try_from(rpc_request)?;
        let learn = self
            .local_replica()?
            .accept(accept)
            .await
            .map_err(|e| Status::unavailable(e.to_string()))?;

        Ok(learn.into())
    }

    async fn handle_commit(&self, rpc_request: ProtoLearn) -> Result<ProtoEmpty, Status> {
        let learn = Learn::try_from(rpc_request)?;
        self.local_replica()?
            .commit(learn)
            .await
            .map_err(|e| Status::unavailable(e.to_string()))?;

        Ok(ProtoEmpty {})
    }

    async fn handle_client_handle(&self, rpc_request: ProtoValue) -> Result<ProtoResponseResult, Status> {
        let value = Value::from(rpc_request);
        let result = match self.local_replica.upgrade() {
            Ok(local_replica) => local_replica.client_handle(value, self.client_handle_timeout).await,
            Err(_) => Err(ClientHandleError::ReplicaExited),
        };

        Ok(result.into())
    }

    async fn handle_heartbeat(&self, rpc_request: ProtoHeartbeat) -> Result<ProtoEmpty, Status> {
        let heartbeat = Heartbeat::from(rpc_request);
        self.local_replica()?
            .heartbeat(heartbeat)
            .await
            .map_err(|e| Status::unavailable(e.to_string()))?;

        Ok(ProtoEmpty {})
    }
}

#[async_trait::async_trait]
impl GrpcPaxos for RpcServer {
    async fn prepare(&self, request: Request<ProtoPrepare>) -> Result<Response<ProtoPromiseResult>, Status> {
        slog::debug!(self.logger, "ServerWire - {:?}", request);
        let result = self.handle_prepare(request.into_inner()).await;
        slog::debug!(self.logger, "ServerWire - {:?}", result);
        result.map(Response::new)
    }

    async fn accept(&self, request: Request<ProtoAccept>) -> Result<Response<ProtoLearnResult>, Status> {
        slog::debug!(self.logger, "ServerWire - {:?}", request);
        let result = self.handle_accept(request.into_inner()).await;
        slog::debug!(self.logger, "ServerWire - {:?}", result);
        result.map(Response::new)
    }

    async fn commit(&self, request: Request<ProtoLearn>) -> Result<Response<ProtoEmpty>, Status> {
        slog::debug!(self.logger, "ServerWire - {:?}", request);
        self.handle_commit(request.into_inner()).await.map(Response::new)
    }

    async fn client_handle(&self, request: Request<ProtoValue>) -> Result<Response<ProtoResponseResult>, Status> {
        slog::debug!(self.logger, "ServerWire - {:?}", request);
        let result = self.handle_client_handle(request.into_inner()).await;
        slog::debug!(self.logger, "ServerWire - {:?}", result);
        result.map(Response::new)
    }

    async fn heartbeat(&self, request: Request<ProtoHeartbeat>) -> Result<Response<ProtoEmpty>, Status> {
        self.handle_heartbeat(request.into_inner()).await.map(Response::new)
    }
}
