use crate::replica::ReplicaId;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// One member of a fixed cluster and where its RPC server listens.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaxosMemberInfo {
    pub replica_id: i32,
    pub ip_addr: Ipv4Addr,
    pub rpc_port: u16,
}

impl PaxosMemberInfo {
    pub(crate) fn id(&self) -> ReplicaId {
        ReplicaId::new(self.replica_id)
    }

    pub(crate) fn rpc_server_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.ip_addr, self.rpc_port))
    }
}
