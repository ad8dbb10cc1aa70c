//! Best-effort static bounds check for INDEX nodes.
//!
//! Not a soundness proof: expressions the analysis cannot bound are accepted
//! conservatively, and `VerifyOptions::ignore_oob` disables the check
//! entirely as an escape hatch. False negatives are acceptable; a false
//! positive on a statically bounded, non-symbolic index is a bug.

use std::sync::Arc;

use crate::op::Ops;
use crate::pattern::Verdict;
use crate::types::Arg;
use crate::uop::UOp;
use crate::verify::VerifyOptions;

/// Whether the offset expression contains a construct whose value cannot be
/// bounded statically: a runtime variable, a bit reinterpretation, or a
/// hardware special id with a non-integer extent component.
fn has_unbounded_leaf(idx: &Arc<UOp>) -> bool {
    idx.toposort().iter().any(|x| match x.op() {
        Ops::DefineVar | Ops::Bitcast => true,
        Ops::Special => match x.arg().as_tuple() {
            Some(items) => items.iter().skip(1).any(|a| !matches!(a, Arg::Int(_))),
            None => true,
        },
        _ => false,
    })
}

/// Judge an INDEX node's offset against its buffer's declared extent.
///
/// A gated (masked) access is accepted as-is: the gate is assumed to guard
/// the out-of-range lanes. Image-typed indices use the hardware's 2-D
/// addressing and are skipped likewise.
pub(crate) fn validate_index(
    idx: &Arc<UOp>,
    mask: Option<&Arc<UOp>>,
    opts: &VerifyOptions,
) -> Verdict {
    if opts.ignore_oob {
        return Verdict::Accept;
    }

    if mask.is_none() && !idx.dtype().is_image() {
        let [buffer, offset, ..] = idx.src() else {
            return Verdict::Accept;
        };

        if has_unbounded_leaf(idx) {
            return Verdict::Accept;
        }

        let (vmin, vmax) = (offset.vmin(), offset.vmax());
        if let Some(size) = buffer.dtype().mem_size()
            && (vmin < 0 || vmax >= size as i64)
        {
            if opts.debug >= 1 {
                tracing::warn!(
                    vmin,
                    vmax,
                    size,
                    expr = %offset.render(),
                    "out of bounds access in INDEX"
                );
            }
            return Verdict::Reject;
        }
    }

    Verdict::Accept
}
