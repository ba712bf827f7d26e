use std::fmt;

/// Node identifier taken from the cluster's `address -> id` map. Negative ids may exist in a
/// node set but are never trusted as leader.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ReplicaId(i32);

impl ReplicaId {
    pub fn new(id: i32) -> Self {
        ReplicaId(id)
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Debug for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ballot number. Proposer `i` of `n` only ever uses `i, i+n, i+2n, ...`.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Round(i32);

impl Round {
    pub const NONE: Round = Round(-1);

    pub fn new(round: i32) -> Self {
        Round(round)
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }

    /// Next round in the interleaved sequence of the proposer that owns `self`.
    pub(crate) fn next_for(&self, num_proposers: i32) -> Round {
        Round(self.0 + num_proposers)
    }
}

impl fmt::Debug for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Log position. Real slots start at 1.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Slot(u32);

impl Slot {
    pub const NONE: Slot = Slot(0);

    pub fn new(slot: u32) -> Self {
        Slot(slot)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn next(&self) -> Slot {
        Slot(self.0 + 1)
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A client command, or a no-op filler for a slot nobody voted on.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct Value {
    pub client_id: String,
    pub client_seq: u32,
    pub command: String,
    pub is_noop: bool,
}

impl Value {
    pub fn new(client_id: impl Into<String>, client_seq: u32, command: impl Into<String>) -> Self {
        Value {
            client_id: client_id.into(),
            client_seq,
            command: command.into(),
            is_noop: false,
        }
    }

    pub fn noop() -> Self {
        Value {
            is_noop: true,
            ..Value::default()
        }
    }

    pub fn to_response(&self) -> Response {
        Response {
            client_id: self.client_id.clone(),
            client_seq: self.client_seq,
            command: self.command.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct Response {
    pub client_id: String,
    pub client_seq: u32,
    pub command: String,
}

/// A vote cast by an acceptor: `vval` was accepted for `slot` in round `vrnd`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct PValue {
    pub(crate) slot: Slot,
    pub(crate) vrnd: Round,
    pub(crate) vval: Value,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Prepare {
    pub(crate) from: ReplicaId,
    pub(crate) slot: Slot,
    pub(crate) crnd: Round,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Promise {
    pub(crate) to: ReplicaId,
    pub(crate) from: ReplicaId,
    pub(crate) rnd: Round,
    pub(crate) accepted: Vec<PValue>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Accept {
    pub(crate) from: ReplicaId,
    pub(crate) slot: Slot,
    pub(crate) rnd: Round,
    pub(crate) val: Value,
}

/// An acceptor's vote for a slot. Once a quorum agrees on it, it is the slot's decision.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Learn {
    pub from: ReplicaId,
    pub slot: Slot,
    pub rnd: Round,
    pub val: Value,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum HeartbeatKind {
    Request,
    Reply,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Heartbeat {
    pub(crate) from: ReplicaId,
    pub(crate) to: ReplicaId,
    pub(crate) kind: HeartbeatKind,
}
