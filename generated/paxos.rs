#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoEmpty {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoValue {
    #[prost(string, tag = "1")]
    pub client_id: ::prost::alloc::string::String,
    #[prost(uint32, tag = "2")]
    pub client_seq: u32,
    #[prost(string, tag = "3")]
    pub command: ::prost::alloc::string::String,
    #[prost(bool, tag = "4")]
    pub is_noop: bool,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPValue {
    #[prost(uint32, tag = "1")]
    pub slot: u32,
    #[prost(int32, tag = "2")]
    pub vrnd: i32,
    #[prost(message, optional, tag = "3")]
    pub vval: ::core::option::Option<ProtoValue>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPrepare {
    #[prost(int32, tag = "1")]
    pub from: i32,
    #[prost(uint32, tag = "2")]
    pub slot: u32,
    #[prost(int32, tag = "3")]
    pub crnd: i32,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPromise {
    #[prost(int32, tag = "1")]
    pub to: i32,
    #[prost(int32, tag = "2")]
    pub from: i32,
    #[prost(int32, tag = "3")]
    pub rnd: i32,
    #[prost(message, repeated, tag = "4")]
    pub accepted: ::prost::alloc::vec::Vec<ProtoPValue>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPromiseResult {
    #[prost(message, optional, tag = "1")]
    pub promise: ::core::option::Option<ProtoPromise>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAccept {
    #[prost(int32, tag = "1")]
    pub from: i32,
    #[prost(uint32, tag = "2")]
    pub slot: u32,
    #[prost(int32, tag = "3")]
    pub rnd: i32,
    #[prost(message, optional, tag = "4")]
    pub val: ::core::option::Option<ProtoValue>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLearn {
    #[prost(int32, tag = "1")]
    pub from: i32,
    #[prost(uint32, tag = "2")]
    pub slot: u32,
    #[prost(int32, tag = "3")]
    pub rnd: i32,
    #[prost(message, optional, tag = "4")]
    pub val: ::core::option::Option<ProtoValue>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLearnResult {
    #[prost(message, optional, tag = "1")]
    pub learn: ::core::option::Option<ProtoLearn>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoResponse {
    #[prost(string, tag = "1")]
    pub client_id: ::prost::alloc::string::String,
    #[prost(uint32, tag = "2")]
    pub client_seq: u32,
    #[prost(string, tag = "3")]
    pub command: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoServerFault {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoResponseResult {
    #[prost(oneof = "proto_response_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_response_result::Result>,
}
/// Nested message and enum types in `ProtoResponseResult`.
pub mod proto_response_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoResponse),
        #[prost(message, tag = "2")]
        Err(super::ProtoServerFault),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoHeartbeat {
    #[prost(int32, tag = "1")]
    pub from: i32,
    #[prost(int32, tag = "2")]
    pub to: i32,
    #[prost(bool, tag = "3")]
    pub request: bool,
}
#[doc = r" Generated client implementations."]
pub mod grpc_paxos_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    pub struct GrpcPaxosClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcPaxosClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> GrpcPaxosClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + HttpBody + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as HttpBody>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = tonic::client::Grpc::with_interceptor(inner, interceptor);
            Self { inner }
        }
        #[doc = " Phase 1. An absent promise means the acceptor ignored the prepare."]
        pub async fn prepare(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoPrepare>,
        ) -> Result<tonic::Response<super::ProtoPromiseResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/paxos.GrpcPaxos/Prepare");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Phase 2. An absent learn means the acceptor ignored the accept."]
        pub async fn accept(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoAccept>,
        ) -> Result<tonic::Response<super::ProtoLearnResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/paxos.GrpcPaxos/Accept");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn commit(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoLearn>,
        ) -> Result<tonic::Response<super::ProtoEmpty>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/paxos.GrpcPaxos/Commit");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Blocks until the value is decided or the server side deadline expires."]
        pub async fn client_handle(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoValue>,
        ) -> Result<tonic::Response<super::ProtoResponseResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/paxos.GrpcPaxos/ClientHandle");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn heartbeat(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoHeartbeat>,
        ) -> Result<tonic::Response<super::ProtoEmpty>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/paxos.GrpcPaxos/Heartbeat");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for GrpcPaxosClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for GrpcPaxosClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "GrpcPaxosClient {{ ... }}")
        }
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_paxos_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcPaxosServer."]
    #[async_trait]
    pub trait GrpcPaxos: Send + Sync + 'static {
        #[doc = " Phase 1. An absent promise means the acceptor ignored the prepare."]
        async fn prepare(
            &self,
            request: tonic::Request<super::ProtoPrepare>,
        ) -> Result<tonic::Response<super::ProtoPromiseResult>, tonic::Status>;
        #[doc = " Phase 2. An absent learn means the acceptor ignored the accept."]
        async fn accept(
            &self,
            request: tonic::Request<super::ProtoAccept>,
        ) -> Result<tonic::Response<super::ProtoLearnResult>, tonic::Status>;
        async fn commit(
            &self,
            request: tonic::Request<super::ProtoLearn>,
        ) -> Result<tonic::Response<super::ProtoEmpty>, tonic::Status>;
        #[doc = " Blocks until the value is decided or the server side deadline expires."]
        async fn client_handle(
            &self,
            request: tonic::Request<super::ProtoValue>,
        ) -> Result<tonic::Response<super::ProtoResponseResult>, tonic::Status>;
        async fn heartbeat(
            &self,
            request: tonic::Request<super::ProtoHeartbeat>,
        ) -> Result<tonic::Response<super::ProtoEmpty>, tonic::Status>;
    }
    #[derive(Debug)]
    pub struct GrpcPaxosServer<T: GrpcPaxos> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: GrpcPaxos> GrpcPaxosServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, None);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, Some(interceptor.into()));
            Self { inner }
        }
    }
    impl<T, B> Service<http::Request<B>> for GrpcPaxosServer<T>
    where
        T: GrpcPaxos,
        B: HttpBody + Send + Sync + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/paxos.GrpcPaxos/Prepare" => {
                    #[allow(non_camel_case_types)]
                    struct PrepareSvc<T: GrpcPaxos>(pub Arc<T>);
                    impl<T: GrpcPaxos> tonic::server::UnaryService<super::ProtoPrepare> for PrepareSvc<T> {
                        type Response = super::ProtoPromiseResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoPrepare>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).prepare(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = PrepareSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/paxos.GrpcPaxos/Accept" => {
                    #[allow(non_camel_case_types)]
                    struct AcceptSvc<T: GrpcPaxos>(pub Arc<T>);
                    impl<T: GrpcPaxos> tonic::server::UnaryService<super::ProtoAccept> for AcceptSvc<T> {
                        type Response = super::ProtoLearnResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoAccept>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).accept(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = AcceptSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/paxos.GrpcPaxos/Commit" => {
                    #[allow(non_camel_case_types)]
                    struct CommitSvc<T: GrpcPaxos>(pub Arc<T>);
                    impl<T: GrpcPaxos> tonic::server::UnaryService<super::ProtoLearn> for CommitSvc<T> {
                        type Response = super::ProtoEmpty;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoLearn>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).commit(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = CommitSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/paxos.GrpcPaxos/ClientHandle" => {
                    #[allow(non_camel_case_types)]
                    struct ClientHandleSvc<T: GrpcPaxos>(pub Arc<T>);
                    impl<T: GrpcPaxos> tonic::server::UnaryService<super::ProtoValue> for ClientHandleSvc<T> {
                        type Response = super::ProtoResponseResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoValue>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).client_handle(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = ClientHandleSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/paxos.GrpcPaxos/Heartbeat" => {
                    #[allow(non_camel_case_types)]
                    struct HeartbeatSvc<T: GrpcPaxos>(pub Arc<T>);
                    impl<T: GrpcPaxos> tonic::server::UnaryService<super::ProtoHeartbeat> for HeartbeatSvc<T> {
                        type Response = super::ProtoEmpty;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoHeartbeat>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).heartbeat(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = HeartbeatSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(tonic::body::BoxBody::empty())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: GrpcPaxos> Clone for GrpcPaxosServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: GrpcPaxos> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcPaxos> tonic::transport::NamedService for GrpcPaxosServer<T> {
        const NAME: &'static str = "paxos.GrpcPaxos";
    }
}
