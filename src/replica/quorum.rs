use crate::replica::types::{Accept, Learn, PValue, Prepare, Promise, ReplicaId, Response, Round, Slot, Value};
use std::collections::{BTreeMap, HashMap};

/// How far past the probed slot a promise may report votes. Anything further out is treated as
/// malformed rather than filled with no-ops.
const MAX_RECONCILED_SLOTS: u32 = 1 << 16;

/// Quorum functions for a fixed configuration size. Each is a pure function over the replies
/// collected so far, keyed by sender, and may be called again every time a reply arrives.
#[derive(Copy, Clone, Debug)]
pub(crate) struct PaxosQuorumSpec {
    quorum: usize,
}

impl PaxosQuorumSpec {
    pub(crate) fn new(num_nodes: usize) -> Self {
        PaxosQuorumSpec {
            quorum: get_majority_count(num_nodes),
        }
    }

    pub(crate) fn quorum(&self) -> usize {
        self.quorum
    }

    /// Merges a quorum of promises for `prepare.crnd`. For every slot from the probed slot up to
    /// the highest slot anyone reported, the merged promise carries the highest-round vote seen,
    /// or a no-op stamped at `crnd` if nobody voted for that slot.
    pub(crate) fn prepare_qf(&self, prepare: &Prepare, replies: &HashMap<ReplicaId, Promise>) -> Option<Promise> {
        let mut valid_replies = 0;
        let mut highest_votes: BTreeMap<Slot, &PValue> = BTreeMap::new();

        for promise in replies.values() {
            if promise.rnd != prepare.crnd {
                continue;
            }
            valid_replies += 1;

            for pvalue in promise.accepted.iter().filter(|p| is_valid_pvalue(prepare, p)) {
                match highest_votes.get(&pvalue.slot) {
                    Some(current) if current.vrnd >= pvalue.vrnd => {}
                    _ => {
                        highest_votes.insert(pvalue.slot, pvalue);
                    }
                }
            }
        }

        if valid_replies < self.quorum {
            return None;
        }

        let mut accepted = Vec::new();
        if let Some(max_slot) = highest_votes.keys().next_back().copied() {
            for slot in (prepare.slot.as_u32()..=max_slot.as_u32()).map(Slot::new) {
                let pvalue = match highest_votes.get(&slot) {
                    Some(pvalue) => (*pvalue).clone(),
                    None => PValue {
                        slot,
                        vrnd: prepare.crnd,
                        vval: Value::noop(),
                    },
                };
                accepted.push(pvalue);
            }
        }

        Some(Promise {
            to: prepare.from,
            from: prepare.from,
            rnd: prepare.crnd,
            accepted,
        })
    }

    /// Returns the decision for `accept.slot` once a quorum voted for exactly this proposal.
    pub(crate) fn accept_qf(&self, accept: &Accept, replies: &HashMap<ReplicaId, Learn>) -> Option<Learn> {
        let matching = replies
            .values()
            .filter(|learn| learn.slot == accept.slot && learn.rnd == accept.rnd && learn.val == accept.val)
            .count();

        if matching < self.quorum {
            return None;
        }

        Some(Learn {
            from: accept.from,
            slot: accept.slot,
            rnd: accept.rnd,
            val: accept.val.clone(),
        })
    }

    pub(crate) fn client_handle_qf(&self, request: &Value, replies: &HashMap<ReplicaId, Response>) -> Option<Response> {
        let matching = replies
            .values()
            .filter(|response| {
                response.client_id == request.client_id
                    && response.client_seq == request.client_seq
                    && response.command == request.command
            })
            .count();

        if matching < self.quorum {
            return None;
        }

        Some(request.to_response())
    }
}

fn get_majority_count(num_nodes: usize) -> usize {
    num_nodes / 2 + 1
}

fn is_valid_pvalue(prepare: &Prepare, pvalue: &PValue) -> bool {
    pvalue.slot != Slot::NONE
        && pvalue.vrnd != Round::NONE
        && pvalue.slot >= prepare.slot
        && pvalue.slot.as_u32() - prepare.slot.as_u32() < MAX_RECONCILED_SLOTS
        && pvalue.vrnd <= prepare.crnd
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(id: i32) -> ReplicaId {
        ReplicaId::new(id)
    }

    fn pvalue(slot: u32, vrnd: i32, vval: &Value) -> PValue {
        PValue {
            slot: Slot::new(slot),
            vrnd: Round::new(vrnd),
            vval: vval.clone(),
        }
    }

    fn noop(slot: u32, vrnd: i32) -> PValue {
        pvalue(slot, vrnd, &Value::noop())
    }

    fn promise(from: i32, rnd: i32, accepted: Vec<PValue>) -> (ReplicaId, Promise) {
        (
            id(from),
            Promise {
                to: id(0),
                from: id(from),
                rnd: Round::new(rnd),
                accepted,
            },
        )
    }

    fn prepare(slot: u32, crnd: i32) -> Prepare {
        Prepare {
            from: id(0),
            slot: Slot::new(slot),
            crnd: Round::new(crnd),
        }
    }

    fn learn(from: i32, slot: u32, rnd: i32, val: &Value) -> (ReplicaId, Learn) {
        (
            id(from),
            Learn {
                from: id(from),
                slot: Slot::new(slot),
                rnd: Round::new(rnd),
                val: val.clone(),
            },
        )
    }

    #[test]
    fn quorum_sizes() {
        let cases = [(1, 1), (2, 2), (3, 2), (4, 3), (5, 3), (7, 4), (9, 5)];
        for (num_nodes, expected) in cases.iter() {
            assert_eq!(PaxosQuorumSpec::new(*num_nodes).quorum(), *expected, "n={}", num_nodes);
        }
    }

    #[test]
    fn prepare_qf_without_quorum() {
        let qspec = PaxosQuorumSpec::new(3);
        let replies: HashMap<_, _> = vec![promise(1, 2, vec![])].into_iter().collect();

        assert_eq!(qspec.prepare_qf(&prepare(1, 2), &replies), None);
    }

    #[test]
    fn prepare_qf_ignores_replies_for_other_rounds() {
        let qspec = PaxosQuorumSpec::new(3);
        let replies: HashMap<_, _> = vec![promise(1, 2, vec![]), promise(2, 1, vec![])].into_iter().collect();

        assert_eq!(qspec.prepare_qf(&prepare(1, 2), &replies), None);
    }

    #[test]
    fn prepare_qf_quorum_without_history() {
        let qspec = PaxosQuorumSpec::new(3);
        let replies: HashMap<_, _> = vec![promise(1, 2, vec![]), promise(2, 2, vec![])].into_iter().collect();

        let merged = qspec.prepare_qf(&prepare(1, 2), &replies).unwrap();
        assert_eq!(merged.rnd, Round::new(2));
        assert!(merged.accepted.is_empty());
    }

    #[test]
    fn prepare_qf_picks_highest_vrnd_per_slot_and_fills_gaps_with_noops() {
        let qspec = PaxosQuorumSpec::new(5);
        let a = Value::new("a", 1, "cmd-a");
        let b = Value::new("b", 1, "cmd-b");
        let c = Value::new("c", 1, "cmd-c");
        let replies: HashMap<_, _> = vec![
            promise(1, 6, vec![pvalue(2, 1, &a), pvalue(5, 1, &c)]),
            promise(2, 6, vec![pvalue(2, 4, &b)]),
            promise(3, 6, vec![pvalue(2, 3, &a), pvalue(3, 2, &c)]),
        ]
        .into_iter()
        .collect();

        let merged = qspec.prepare_qf(&prepare(2, 6), &replies).unwrap();
        assert_eq!(
            merged.accepted,
            vec![pvalue(2, 4, &b), pvalue(3, 2, &c), noop(4, 6), pvalue(5, 1, &c)]
        );
    }

    #[test]
    fn prepare_qf_fills_from_probed_slot() {
        let qspec = PaxosQuorumSpec::new(3);
        let a = Value::new("a", 1, "cmd-a");
        let replies: HashMap<_, _> = vec![promise(1, 4, vec![pvalue(3, 1, &a)]), promise(2, 4, vec![])]
            .into_iter()
            .collect();

        let merged = qspec.prepare_qf(&prepare(1, 4), &replies).unwrap();
        assert_eq!(merged.accepted, vec![noop(1, 4), noop(2, 4), pvalue(3, 1, &a)]);
    }

    #[test]
    fn prepare_qf_discards_invalid_pvalues() {
        let qspec = PaxosQuorumSpec::new(3);
        let a = Value::new("a", 1, "cmd-a");
        let b = Value::new("b", 1, "cmd-b");
        let replies: HashMap<_, _> = vec![
            // Below the probed slot, and from a future round.
            promise(1, 4, vec![pvalue(1, 2, &a), pvalue(3, 9, &b)]),
            // Sentinel slot and sentinel round.
            promise(2, 4, vec![pvalue(0, 2, &a), pvalue(4, -1, &b), pvalue(2, 3, &a)]),
        ]
        .into_iter()
        .collect();

        let merged = qspec.prepare_qf(&prepare(2, 4), &replies).unwrap();
        assert_eq!(merged.accepted, vec![pvalue(2, 3, &a)]);
    }

    #[test]
    fn prepare_qf_ignores_votes_far_past_the_probed_slot() {
        let qspec = PaxosQuorumSpec::new(3);
        let a = Value::new("a", 1, "cmd-a");
        let b = Value::new("b", 1, "cmd-b");
        let replies: HashMap<_, _> = vec![
            promise(1, 4, vec![pvalue(1, 2, &a), pvalue(u32::MAX, 2, &b)]),
            promise(2, 4, vec![pvalue(1 + MAX_RECONCILED_SLOTS, 2, &b)]),
        ]
        .into_iter()
        .collect();

        let merged = qspec.prepare_qf(&prepare(1, 4), &replies).unwrap();
        assert_eq!(merged.accepted, vec![pvalue(1, 2, &a)]);
    }

    #[test]
    fn accept_qf_needs_quorum_of_identical_learns() {
        let qspec = PaxosQuorumSpec::new(3);
        let x = Value::new("1234", 1, "ls");
        let y = Value::new("1234", 2, "rm");
        let accept = Accept {
            from: id(2),
            slot: Slot::new(1),
            rnd: Round::new(2),
            val: x.clone(),
        };

        let replies: HashMap<_, _> = vec![learn(0, 1, 2, &x)].into_iter().collect();
        assert_eq!(qspec.accept_qf(&accept, &replies), None);

        let replies: HashMap<_, _> = vec![learn(0, 1, 2, &x), learn(1, 1, 2, &x)].into_iter().collect();
        let decided = qspec.accept_qf(&accept, &replies).unwrap();
        assert_eq!((decided.slot, decided.rnd, decided.val), (Slot::new(1), Round::new(2), x.clone()));

        let replies: HashMap<_, _> = vec![learn(0, 1, 2, &x), learn(1, 1, 2, &y)].into_iter().collect();
        assert_eq!(qspec.accept_qf(&accept, &replies), None);

        let replies: HashMap<_, _> = vec![learn(0, 1, 2, &x), learn(1, 2, 2, &x)].into_iter().collect();
        assert_eq!(qspec.accept_qf(&accept, &replies), None);

        let replies: HashMap<_, _> = vec![learn(0, 1, 2, &x), learn(1, 1, 3, &x)].into_iter().collect();
        assert_eq!(qspec.accept_qf(&accept, &replies), None);
    }

    #[test]
    fn client_handle_qf_needs_quorum_of_matching_responses() {
        let qspec = PaxosQuorumSpec::new(3);
        let request = Value::new("1234", 1, "ls");
        let other = Value::new("1234", 2, "ls");

        let replies: HashMap<_, _> = vec![(id(0), request.to_response()), (id(1), other.to_response())]
            .into_iter()
            .collect();
        assert_eq!(qspec.client_handle_qf(&request, &replies), None);

        let replies: HashMap<_, _> = vec![
            (id(0), request.to_response()),
            (id(1), other.to_response()),
            (id(2), request.to_response()),
        ]
        .into_iter()
        .collect();
        assert_eq!(qspec.client_handle_qf(&request, &replies), Some(request.to_response()));
    }
}
