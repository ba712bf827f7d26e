use crate::replica::types::{Accept, Learn, PValue, Prepare, Promise, ReplicaId, Round, Slot};
use std::collections::BTreeMap;

/// Per-node vote bookkeeping. Only incoming Prepare/Accept messages mutate it.
pub(crate) struct Acceptor {
    logger: slog::Logger,
    my_replica_id: ReplicaId,
    rnd: Round,
    accepted: BTreeMap<Slot, PValue>,
}

impl Acceptor {
    pub(crate) fn new(logger: slog::Logger, my_replica_id: ReplicaId) -> Self {
        Acceptor {
            logger,
            my_replica_id,
            rnd: Round::NONE,
            accepted: BTreeMap::new(),
        }
    }

    /// Returns `None` for a stale prepare. Callers treat that as "no reply".
    pub(crate) fn handle_prepare(&mut self, prepare: Prepare) -> Option<Promise> {
        if prepare.crnd <= self.rnd {
            slog::debug!(
                self.logger,
                "Ignoring Prepare at round {:?}, already promised {:?}",
                prepare.crnd,
                self.rnd
            );
            return None;
        }
        self.rnd = prepare.crnd;

        let accepted = self
            .accepted
            .range(prepare.slot..)
            .map(|(_, pvalue)| pvalue.clone())
            .collect();

        Some(Promise {
            to: prepare.from,
            from: self.my_replica_id,
            rnd: self.rnd,
            accepted,
        })
    }

    /// Accepting at exactly the promised round must succeed, so the comparison is `>=`.
    pub(crate) fn handle_accept(&mut self, accept: Accept) -> Option<Learn> {
        if accept.rnd < self.rnd {
            slog::debug!(
                self.logger,
                "Ignoring Accept for slot {:?} at round {:?}, already promised {:?}",
                accept.slot,
                accept.rnd,
                self.rnd
            );
            return None;
        }
        self.rnd = accept.rnd;

        self.accepted.insert(
            accept.slot,
            PValue {
                slot: accept.slot,
                vrnd: accept.rnd,
                vval: accept.val.clone(),
            },
        );

        Some(Learn {
            from: self.my_replica_id,
            slot: accept.slot,
            rnd: accept.rnd,
            val: accept.val,
        })
    }

    #[cfg(test)]
    pub(crate) fn rnd(&self) -> Round {
        self.rnd
    }
}
