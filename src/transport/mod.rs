mod configuration;
mod convert;
mod grpc;
mod local;
mod node;

pub(crate) use configuration::Configuration;
pub use grpc::ConnectError;
pub(crate) use grpc::GrpcNode;
pub(crate) use local::{LocalNode, NetworkSwitch};
pub(crate) use node::PaxosNode;
