use crate::grpc::{
    proto_response_result, ProtoAccept, ProtoHeartbeat, ProtoLearn, ProtoLearnResult, ProtoPValue, ProtoPrepare,
    ProtoPromise, ProtoPromiseResult, ProtoResponse, ProtoResponseResult, ProtoServerFault, ProtoValue,
};
use crate::replica::{
    Accept, ClientHandleError, Heartbeat, HeartbeatKind, Learn, PValue, Prepare, Promise, ReplicaId, Response, Round,
    RpcError, Slot, Value,
};
use std::convert::TryFrom;
use tonic::Status;

#[derive(Debug, thiserror::Error)]
#[error("Missing required field '{0}'")]
pub struct MissingField(&'static str);

impl From<MissingField> for Status {
    fn from(e: MissingField) -> Self {
        Status::invalid_argument(e.to_string())
    }
}

impl From<MissingField> for RpcError {
    fn from(e: MissingField) -> Self {
        RpcError::Malformed(e.to_string())
    }
}

// ------- Value --------

impl From<&Value> for ProtoValue {
    fn from(value: &Value) -> Self {
        ProtoValue {
            client_id: value.client_id.clone(),
            client_seq: value.client_seq,
            command: value.command.clone(),
            is_noop: value.is_noop,
        }
    }
}

impl From<ProtoValue> for Value {
    fn from(proto: ProtoValue) -> Self {
        Value {
            client_id: proto.client_id,
            client_seq: proto.client_seq,
            command: proto.command,
            is_noop: proto.is_noop,
        }
    }
}

fn required_value(proto: Option<ProtoValue>, field: &'static str) -> Result<Value, MissingField> {
    proto.map(Value::from).ok_or(MissingField(field))
}

// ------- Phase 1 --------

impl From<&Prepare> for ProtoPrepare {
    fn from(prepare: &Prepare) -> Self {
        ProtoPrepare {
            from: prepare.from.as_i32(),
            slot: prepare.slot.as_u32(),
            crnd: prepare.crnd.as_i32(),
        }
    }
}

impl From<ProtoPrepare> for Prepare {
    fn from(proto: ProtoPrepare) -> Self {
        Prepare {
            from: ReplicaId::new(proto.from),
            slot: Slot::new(proto.slot),
            crnd: Round::new(proto.crnd),
        }
    }
}

impl From<Option<Promise>> for ProtoPromiseResult {
    fn from(promise: Option<Promise>) -> Self {
        ProtoPromiseResult {
            promise: promise.map(|promise| ProtoPromise {
                to: promise.to.as_i32(),
                from: promise.from.as_i32(),
                rnd: promise.rnd.as_i32(),
                accepted: promise
                    .accepted
                    .iter()
                    .map(|pvalue| ProtoPValue {
                        slot: pvalue.slot.as_u32(),
                        vrnd: pvalue.vrnd.as_i32(),
                        vval: Some(ProtoValue::from(&pvalue.vval)),
                    })
                    .collect(),
            }),
        }
    }
}

/// A vote without a value can never win reconciliation, so it is dropped here.
impl From<ProtoPromiseResult> for Option<Promise> {
    fn from(proto: ProtoPromiseResult) -> Self {
        proto.promise.map(|promise| Promise {
            to: ReplicaId::new(promise.to),
            from: ReplicaId::new(promise.from),
            rnd: Round::new(promise.rnd),
            accepted: promise
                .accepted
                .into_iter()
                .filter_map(|pvalue| {
                    let vval = pvalue.vval?;
                    Some(PValue {
                        slot: Slot::new(pvalue.slot),
                        vrnd: Round::new(pvalue.vrnd),
                        vval: vval.into(),
                    })
                })
                .collect(),
        })
    }
}

// ------- Phase 2 --------

impl From<&Accept> for ProtoAccept {
    fn from(accept: &Accept) -> Self {
        ProtoAccept {
            from: accept.from.as_i32(),
            slot: accept.slot.as_u32(),
            rnd: accept.rnd.as_i32(),
            val: Some(ProtoValue::from(&accept.val)),
        }
    }
}

impl TryFrom<ProtoAccept> for Accept {
    type Error = MissingField;

    fn try_from(proto: ProtoAccept) -> Result<Self, Self::Error> {
        Ok(Accept {
            from: ReplicaId::new(proto.from),
            slot: Slot::new(proto.slot),
            rnd: Round::new(proto.rnd),
            val: required_value(proto.val, "val")?,
        })
    }
}

impl From<&Learn> for ProtoLearn {
    fn from(learn: &Learn) -> Self {
        ProtoLearn {
            from: learn.from.as_i32(),
            slot: learn.slot.as_u32(),
            rnd: learn.rnd.as_i32(),
            val: Some(ProtoValue::from(&learn.val)),
        }
    }
}

impl TryFrom<ProtoLearn> for Learn {
    type Error = MissingField;

    fn try_from(proto: ProtoLearn) -> Result<Self, Self::Error> {
        Ok(Learn {
            from: ReplicaId::new(proto.from),
            slot: Slot::new(proto.slot),
            rnd: Round::new(proto.rnd),
            val: required_value(proto.val, "val")?,
        })
    }
}

impl From<Option<Learn>> for ProtoLearnResult {
    fn from(learn: Option<Learn>) -> Self {
        ProtoLearnResult {
            learn: learn.as_ref().map(ProtoLearn::from),
        }
    }
}

impl TryFrom<ProtoLearnResult> for Option<Learn> {
    type Error = MissingField;

    fn try_from(proto: ProtoLearnResult) -> Result<Self, Self::Error> {
        proto.learn.map(Learn::try_from).transpose()
    }
}

// ------- Client --------

impl From<Result<Response, ClientHandleError>> for ProtoResponseResult {
    fn from(result: Result<Response, ClientHandleError>) -> Self {
        let result = match result {
            Ok(response) => proto_response_result::Result::Ok(ProtoResponse {
                client_id: response.client_id,
                client_seq: response.client_seq,
                command: response.command,
            }),
            Err(e) => proto_response_result::Result::Err(ProtoServerFault { message: e.to_string() }),
        };

        ProtoResponseResult { result: Some(result) }
    }
}

impl From<ProtoResponseResult> for Result<Response, RpcError> {
    fn from(proto: ProtoResponseResult) -> Self {
        match proto.result {
            Some(proto_response_result::Result::Ok(response)) => Ok(Response {
                client_id: response.client_id,
                client_seq: response.client_seq,
                command: response.command,
            }),
            Some(proto_response_result::Result::Err(fault)) => Err(RpcError::ServerFault(fault.message)),
            None => Err(MissingField("result").into()),
        }
    }
}

// ------- Failure detector --------

impl From<&Heartbeat> for ProtoHeartbeat {
    fn from(heartbeat: &Heartbeat) -> Self {
        ProtoHeartbeat {
            from: heartbeat.from.as_i32(),
            to: heartbeat.to.as_i32(),
            request: heartbeat.kind == HeartbeatKind::Request,
        }
    }
}

impl From<ProtoHeartbeat> for Heartbeat {
    fn from(proto: ProtoHeartbeat) -> Self {
        Heartbeat {
            from: ReplicaId::new(proto.from),
            to: ReplicaId::new(proto.to),
            kind: if proto.request {
                HeartbeatKind::Request
            } else {
                HeartbeatKind::Reply
            },
        }
    }
}
