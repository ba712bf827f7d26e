use crate::replica::replica_api::NotAMember;
use crate::replica::types::{Accept, Prepare, Promise, ReplicaId, Round, Slot, Value};
use std::collections::VecDeque;

/// Proposer half of a node. Only acts while it believes itself leader: first a single phase 1
/// covering every slot past `adu`, then one phase 2 accept at a time.
///
/// The proposer never talks to the network itself; the replica drives it and feeds back the
/// quorum call results.
pub(crate) struct Proposer {
    logger: slog::Logger,
    my_replica_id: ReplicaId,
    num_proposers: i32,
    leader: Option<ReplicaId>,
    crnd: Round,
    adu: Slot,
    next_slot: Slot,
    phase_one_done: bool,
    accept_queue: VecDeque<Accept>,
    client_queue: VecDeque<Value>,
}

impl Proposer {
    /// The position of `my_replica_id` in the sorted id list picks the proposer's round sequence.
    pub(crate) fn new(
        logger: slog::Logger,
        my_replica_id: ReplicaId,
        node_ids: &[ReplicaId],
        leader: Option<ReplicaId>,
    ) -> Result<Self, NotAMember> {
        let mut sorted_ids = node_ids.to_vec();
        sorted_ids.sort();
        let my_index = sorted_ids
            .iter()
            .position(|id| *id == my_replica_id)
            .ok_or(NotAMember(my_replica_id))?;

        let mut proposer = Proposer {
            logger,
            my_replica_id,
            num_proposers: sorted_ids.len() as i32,
            leader: None,
            crnd: Round::new(my_index as i32),
            adu: Slot::NONE,
            next_slot: Slot::NONE.next(),
            phase_one_done: false,
            accept_queue: VecDeque::new(),
            client_queue: VecDeque::new(),
        };
        proposer.new_leader(leader);

        Ok(proposer)
    }

    pub(crate) fn is_leader(&self) -> bool {
        self.leader == Some(self.my_replica_id)
    }

    pub(crate) fn leader(&self) -> Option<ReplicaId> {
        self.leader
    }

    pub(crate) fn crnd(&self) -> Round {
        self.crnd
    }

    #[cfg(test)]
    pub(crate) fn phase_one_done(&self) -> bool {
        self.phase_one_done
    }

    /// Leadership changed. Whatever phase was in progress is void; if we are the new leader we
    /// move to our next round and have to redo phase 1 before proposing anything.
    pub(crate) fn new_leader(&mut self, leader: Option<ReplicaId>) {
        self.leader = leader;
        self.reset_phase_one();

        if self.is_leader() {
            self.crnd = self.crnd.next_for(self.num_proposers);
            slog::info!(self.logger, "Became leader, using round {:?}", self.crnd);
        }
    }

    /// Phase 1 at the current round timed out. Retry at our next round.
    pub(crate) fn increase_round(&mut self) {
        self.reset_phase_one();
        self.crnd = self.crnd.next_for(self.num_proposers);
        slog::info!(self.logger, "Retrying phase 1 with round {:?}", self.crnd);
    }

    pub(crate) fn prepare_msg(&self) -> Option<Prepare> {
        if !self.is_leader() || self.phase_one_done {
            return None;
        }

        Some(Prepare {
            from: self.my_replica_id,
            slot: self.adu.next(),
            crnd: self.crnd,
        })
    }

    /// Turns a merged promise into pending accepts, in slot order, ahead of any client value.
    pub(crate) fn handle_promise(&mut self, promise: Promise) {
        if !self.is_leader() || promise.rnd != self.crnd {
            slog::debug!(self.logger, "Dropping stale promise for round {:?}", promise.rnd);
            return;
        }

        self.accept_queue.clear();
        for pvalue in promise.accepted {
            if pvalue.slot <= self.adu {
                continue;
            }
            self.accept_queue.push_back(Accept {
                from: self.my_replica_id,
                slot: pvalue.slot,
                rnd: self.crnd,
                val: pvalue.vval,
            });
        }

        // A reconciled value keeps its old slot. It must not also be proposed as a new request.
        let accept_queue = &self.accept_queue;
        self.client_queue
            .retain(|queued| !accept_queue.iter().any(|accept| accept.val == *queued));

        // New client values go after the reconciled range.
        self.next_slot = match self.accept_queue.back() {
            Some(accept) if accept.slot >= self.adu.next() => accept.slot.next(),
            _ => self.adu.next(),
        };
        self.phase_one_done = true;

        slog::info!(
            self.logger,
            "Phase 1 done at round {:?}, {} slots to re-propose, next slot {:?}",
            self.crnd,
            self.accept_queue.len(),
            self.next_slot
        );
    }

    /// Next phase 2 proposal: reconciled slots first, then queued client values.
    pub(crate) fn next_accept(&mut self) -> Option<Accept> {
        if !self.is_leader() || !self.phase_one_done {
            return None;
        }

        if let Some(mut accept) = self.accept_queue.pop_front() {
            accept.rnd = self.crnd;
            return Some(accept);
        }

        let val = self.client_queue.pop_front()?;
        let slot = self.next_slot;
        self.next_slot = self.next_slot.next();

        Some(Accept {
            from: self.my_replica_id,
            slot,
            rnd: self.crnd,
            val,
        })
    }

    /// Queues a client value unless it is already waiting, either as a request or as a
    /// reconciled slot.
    pub(crate) fn enqueue_client_request(&mut self, val: Value) {
        let reconciled = self.accept_queue.iter().any(|accept| accept.val == val);
        if !reconciled && !self.client_queue.contains(&val) {
            self.client_queue.push_back(val);
        }
    }

    /// Puts the value of an abandoned accept back at the head of the client queue.
    pub(crate) fn requeue(&mut self, accept: Accept) {
        if accept.val.is_noop || self.client_queue.contains(&accept.val) {
            return;
        }
        self.client_queue.push_front(accept.val);
    }

    /// A value was decided somewhere in the log, so nobody needs to propose it again.
    pub(crate) fn discard_client_request(&mut self, val: &Value) {
        self.client_queue.retain(|queued| queued != val);
    }

    pub(crate) fn advance_adu(&mut self, adu: Slot) {
        if adu <= self.adu {
            return;
        }
        self.adu = adu;
        self.accept_queue.retain(|accept| accept.slot > adu);
        if self.next_slot <= adu {
            self.next_slot = adu.next();
        }
    }

    /// Pending reconciled accepts are dropped, their client values are kept.
    fn reset_phase_one(&mut self) {
        self.phase_one_done = false;
        while let Some(accept) = self.accept_queue.pop_back() {
            self.requeue(accept);
        }
    }

    #[cfg(test)]
    pub(crate) fn next_slot(&self) -> Slot {
        self.next_slot
    }

    #[cfg(test)]
    pub(crate) fn client_queue_len(&self) -> usize {
        self.client_queue.len()
    }
}
