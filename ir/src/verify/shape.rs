//! Shape consistency rules.
//!
//! Broadcast legality is resolved by the time the other rule sets apply;
//! this set checks the residue: across everything feeding a SINK, each
//! dimension may carry one size (agreement) or two sizes with one of them 1
//! (broadcast), and the SINK's stores must write the same total element
//! count. Below the SINK, shaped sources of a node must agree exactly.

use std::sync::Arc;

use crate::op::{Ops, group};
use crate::pattern::{RuleSet, UPat, Verdict};
use crate::uop::UOp;
use crate::verify::Rules;

fn all_same<T: PartialEq>(items: &[T]) -> bool {
    items.windows(2).all(|w| w[0] == w[1])
}

/// Broadcast law over a SINK's full dependency closure.
fn verify_sink_dims(sink: &Arc<UOp>) -> Verdict {
    // Every store writes the same total element count.
    let mut sizes = Vec::with_capacity(sink.src().len());
    for store in sink.src() {
        let Some(tracker) = store.view_arg() else {
            return Verdict::Reject;
        };
        sizes.push(tracker.size());
    }
    if !all_same(&sizes) {
        return Verdict::Reject;
    }

    // Distinct per-dimension sizes across every shaped node in the closure.
    let closure = sink.toposort();
    let shapes: Vec<_> = closure
        .iter()
        .filter(|x| x.op() != Ops::Sink)
        .filter_map(|x| x.shape())
        .collect();
    let Some(rank) = shapes.iter().map(|s| s.len()).min() else {
        return Verdict::Accept;
    };

    for dim in 0..rank {
        let mut dims: Vec<usize> = shapes.iter().map(|s| s[dim]).collect();
        dims.sort_unstable();
        dims.dedup();
        let broadcastable = match dims.as_slice() {
            [_] => true,
            [first, _] => *first == 1,
            _ => false,
        };
        if !broadcastable {
            return Verdict::Reject;
        }
    }
    Verdict::Accept
}

pub(crate) fn rules() -> Rules {
    RuleSet::new()
        // Shapes feeding a SINK of stores must agree up to broadcast.
        .with(UPat::op(Ops::Sink).src_all(UPat::op(Ops::Store)), |m, _| verify_sink_dims(m.node))
        // Everywhere else, shaped sources agree exactly.
        .with(UPat::ops(group::all() - Ops::Sink), |m, _| {
            let shapes: Vec<_> = m.node.src().iter().filter_map(|x| x.shape()).collect();
            all_same(&shapes).into()
        })
}
