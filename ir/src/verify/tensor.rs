//! Tensor-level semantics rules.
//!
//! Rules for the tensor-graph view before lowering: movement legality,
//! which ops a VIEW may wrap, variable bindings, broadcast constants, the
//! unary passthrough wrappers and device-to-device copies. These layer on
//! top of the buffer topology and assign structure rules.

use enumset::enum_set;

use crate::op::{Ops, group};
use crate::pattern::{RuleSet, UPat, Verdict};
use crate::types::Arg;
use crate::verify::Rules;

pub(crate) fn rules() -> Rules {
    RuleSet::new()
        // Movement is type-preserving: ordinary case keeps the dtype and
        // carries a tuple argument. The one exception is stripping or adding
        // the image wrapper on an already-realized buffer, where only the
        // base dtype must agree.
        .with(UPat::ops(group::MOVEMENT).named("mv").src(vec![UPat::var("x")]), |m, _| {
            let mv = m.node;
            let x = m.get("x");
            let natural = matches!(mv.arg(), Arg::Tuple(_)) && mv.dtype() == x.dtype();
            let image_rewrap = (mv.dtype().is_image() || x.dtype().is_image())
                && x.dtype().base() == mv.dtype().base()
                && x.base().op() == Ops::Buffer;
            (natural || image_rewrap).into()
        })
        // A VIEW may only wrap buffers, buffer views, assigns, constants and
        // devices at this layer.
        .with(
            UPat::op(Ops::View).src(vec![UPat::ops(
                group::all()
                    - enum_set!(
                        Ops::Buffer | Ops::BufferView | Ops::Assign | Ops::Const | Ops::Device
                    ),
            )]),
            |_, _| Verdict::Reject,
        )
        // Variable binding: integer define-var bound to an integer constant
        // or variable, no argument.
        .with(
            UPat::op(Ops::Bind).src(vec![
                UPat::op(Ops::DefineVar),
                UPat::ops(enum_set!(Ops::Const | Ops::DefineVar)),
            ]),
            |m, _| {
                (m.node.dtype().is_int()
                    && m.node.arg().is_none()
                    && m.node.src().iter().all(|s| s.dtype().is_int()))
                .into()
            },
        )
        // A tensor constant has a device and an unmasked single-layer view
        // of stride 0: constants are logically broadcast, never strided.
        .with(
            UPat::op(Ops::Const)
                .src(vec![UPat::op(Ops::View).named("st").src(vec![UPat::op(Ops::Device)])]),
            |m, _| {
                let Some(tracker) = m.get("st").arg().as_view() else {
                    return Verdict::Reject;
                };
                let [view] = tracker.views.as_slice() else {
                    return Verdict::Reject;
                };
                (view.mask.is_none() && view.strides.iter().all(|&s| s == 0)).into()
            },
        )
        // Unary passthrough wrappers keep the dtype and carry no argument.
        .with(UPat::ops(group::PASSTHROUGH).named("root").src(vec![UPat::var("x")]), |m, _| {
            (m.node.arg().is_none() && m.node.dtype() == m.get("x").dtype()).into()
        })
        // COPY to a device; the boolean argument is the clone flag.
        .with(UPat::op(Ops::Copy).src(vec![UPat::op(Ops::Device), UPat::var("x")]), |m, _| {
            (matches!(m.node.arg(), Arg::Bool(_)) && m.node.dtype() == m.get("x").dtype()).into()
        })
}
