//! Buffer topology rules.
//!
//! The lowest layer of the graph: unique-id markers, device nodes, buffers
//! and buffer views. Every deviation here rejects outright - the rest of the
//! system assumes these shapes unconditionally, so there is nothing to defer
//! to.

use dozor_dtype::DType;

use crate::op::Ops;
use crate::pattern::{RuleSet, UPat, Verdict};
use crate::types::Arg;
use crate::verify::Rules;

pub(crate) fn rules() -> Rules {
    RuleSet::new()
        // A unique-id marker carries no structural constraint.
        .with(UPat::op(Ops::Unique).with_dtype(DType::Void).src_empty(), |_, _| Verdict::Accept)
        // A device is named by a string argument.
        .with(UPat::op(Ops::Device).with_dtype(DType::Void).src_empty(), |m, _| {
            matches!(m.node.arg(), Arg::Str(_)).into()
        })
        // A buffer pairs a device with a unique id; its argument is the
        // element count and its dtype is a plain or image data type, never a
        // pointer.
        .with(UPat::op(Ops::Buffer).src(vec![UPat::op(Ops::Device), UPat::op(Ops::Unique)]), |m, _| {
            (matches!(m.node.arg(), Arg::Int(_)) && !m.node.dtype().is_ptr()).into()
        })
        // A buffer view wraps exactly one buffer; its argument is a
        // (size, offset) pair where each element is a plain integer or a
        // node reference (symbolic extent).
        .with(UPat::op(Ops::BufferView).src(vec![UPat::op(Ops::Buffer)]), |m, _| {
            match m.node.arg().as_tuple() {
                Some(items) => (items.len() == 2
                    && items.iter().all(|a| matches!(a, Arg::Int(_) | Arg::Node(_))))
                .into(),
                None => Verdict::Reject,
            }
        })
}
