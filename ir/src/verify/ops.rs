//! Low-level op rules: the type/arity table for the fully lowered IR.
//!
//! Applied to every node regardless of which other sets are active. Rules
//! are declared in a fixed order and the first non-abstaining rule wins;
//! IDIV/MOD deliberately abstain on integer dtypes so the generic ALU rule
//! still enforces operand agreement for them.

use enumset::enum_set;

use dozor_dtype::DType;

use crate::op::{Ops, group};
use crate::pattern::{RuleSet, UPat, Verdict};
use crate::types::Arg;
use crate::verify::{Rules, bounds};

/// Product of the per-axis counts in a CONTRACT/UNROLL argument:
/// a tuple of `(axis, count)` pairs.
fn axis_product(arg: &Arg) -> Option<i64> {
    let items = arg.as_tuple()?;
    let mut product = 1i64;
    for item in items {
        let pair = item.as_tuple()?;
        product = product.checked_mul(pair.get(1)?.as_int()?)?;
    }
    Some(product)
}

pub(crate) fn rules() -> Rules {
    let defs = || UPat::ops(enum_set!(Ops::DefineGlobal | Ops::DefineLocal));
    let bufidx = || UPat::ops(enum_set!(Ops::Index | Ops::Cast));

    RuleSet::new()
        // Memory definitions: global pointers (or images) are never
        // local-flagged, local pointers always are.
        .with(UPat::op(Ops::DefineGlobal), |m, _| {
            let dtype = m.node.dtype();
            ((dtype.is_ptr() || dtype.is_image()) && !dtype.is_local()).into()
        })
        .with(UPat::op(Ops::DefineLocal), |m, _| {
            (m.node.dtype().is_ptr() && m.node.dtype().is_local()).into()
        })
        // Accumulator: initial value of the accumulator's dtype, every
        // further source a loop counter.
        .with(UPat::op(Ops::DefineAcc).src_prefix(vec![UPat::var("c")]), |m, _| {
            (m.node.src()[1..].iter().all(|y| y.op() == Ops::Range)
                && m.get("c").dtype() == m.node.dtype())
            .into()
        })
        // Runtime variable: (name, min, max) with integer bounds.
        .with(UPat::op(Ops::DefineVar), |m, _| match m.node.arg().as_tuple() {
            Some(items) => (matches!(items.get(1), Some(Arg::Int(_)))
                && matches!(items.get(2), Some(Arg::Int(_))))
            .into(),
            None => Verdict::Reject,
        })
        // Loop counter: both endpoints share the counter's dtype, the
        // argument is the loop id.
        .with(UPat::op(Ops::Range).src(vec![UPat::var("x"), UPat::var("y")]), |m, _| {
            let rng = m.node;
            (rng.dtype() == m.get("x").dtype()
                && rng.dtype() == m.get("y").dtype()
                && matches!(rng.arg(), Arg::Int(_)))
            .into()
        })
        .with(UPat::op(Ops::Special).src_empty(), |_, _| Verdict::Accept)
        // VIEW: the void zero-source form is a bare descriptor; the
        // one-source form may wrap anything but a STORE, keeping the base
        // dtype.
        .with(UPat::op(Ops::View).with_dtype(DType::Void).src_empty(), |_, _| Verdict::Accept)
        .with(UPat::op(Ops::View).src(vec![UPat::var("src")]), |m, _| {
            let src = m.get("src");
            (src.op() != Ops::Store && m.node.dtype().base() == src.dtype().base()).into()
        })
        .with(
            UPat::op(Ops::Valid).with_dtype(DType::Bool).src(vec![UPat::op(Ops::View)]),
            |_, _| Verdict::Accept,
        )
        // A constant's payload kind must match what coercion to its dtype
        // would produce.
        .with(UPat::op(Ops::Const), |m, _| {
            match (m.node.arg().const_kind(), Arg::const_kind_for(m.node.dtype())) {
                (Some(actual), Some(expected)) => (actual == expected).into(),
                _ => Verdict::Reject,
            }
        })
        // Early-form LOAD: <buf, view> or <buf, view, store dependency>.
        .with(UPat::op(Ops::Load).src(vec![defs(), UPat::op(Ops::View)]), |_, _| Verdict::Accept)
        .with(
            UPat::op(Ops::Load).src(vec![defs(), UPat::op(Ops::View), UPat::op(Ops::Store)]),
            |_, _| Verdict::Accept,
        )
        // Early-form STORE: <buf, view, value>.
        .with(
            UPat::op(Ops::Store).src(vec![defs(), UPat::op(Ops::View), UPat::any()]),
            |_, _| Verdict::Accept,
        )
        // INDEX: <buf, offset> or <buf, offset, boolean gate>; both forms
        // run the static bounds check.
        .with(UPat::op(Ops::Index).src(vec![defs(), UPat::any()]), |m, opts| {
            bounds::validate_index(m.node, None, opts)
        })
        .with(
            UPat::op(Ops::Index).src(vec![
                defs(),
                UPat::any(),
                UPat::any().with_dtype(DType::Bool).named("mask"),
            ]),
            |m, opts| bounds::validate_index(m.node, m.try_get("mask"), opts),
        )
        // Indexed LOAD: <bufidx>, <bufidx, barrier-or-if>, or
        // <bufidx, alternative value of the load's dtype>.
        .with(UPat::op(Ops::Load).src(vec![bufidx()]), |_, _| Verdict::Accept)
        .with(
            UPat::op(Ops::Load)
                .src(vec![bufidx(), UPat::ops(enum_set!(Ops::If | Ops::Barrier))]),
            |_, _| Verdict::Accept,
        )
        .with(UPat::op(Ops::Load).src(vec![bufidx(), UPat::var("alt")]), |m, _| {
            (m.node.dtype() == m.get("alt").dtype()).into()
        })
        // Indexed STORE: void-typed, <bufidx, value> plus an optional
        // boolean gate or IF gate.
        .with(
            UPat::op(Ops::Store).with_dtype(DType::Void).src(vec![bufidx(), UPat::any()]),
            |_, _| Verdict::Accept,
        )
        .with(
            UPat::op(Ops::Store).with_dtype(DType::Void).src(vec![
                bufidx(),
                UPat::any(),
                UPat::any().with_dtype(DType::Bool),
            ]),
            |_, _| Verdict::Accept,
        )
        .with(
            UPat::op(Ops::Store)
                .with_dtype(DType::Void)
                .src(vec![bufidx(), UPat::any(), UPat::op(Ops::If)]),
            |_, _| Verdict::Accept,
        )
        // ALU exceptions first: WHERE shares one dtype across branches and
        // result, comparisons are boolean over agreeing operands, shifts
        // keep the left dtype.
        .with(
            UPat::op(Ops::Where).src(vec![
                UPat::any().with_dtype(DType::Bool),
                UPat::var("x"),
                UPat::var("y"),
            ]),
            |m, _| {
                (m.node.dtype() == m.get("x").dtype() && m.node.dtype() == m.get("y").dtype())
                    .into()
            },
        )
        .with(
            UPat::ops(enum_set!(Ops::Cmplt | Ops::Cmpne))
                .with_dtype(DType::Bool)
                .src(vec![UPat::var("x"), UPat::var("y")]),
            |m, _| (m.get("x").dtype().base() == m.get("y").dtype().base()).into(),
        )
        .with(
            UPat::ops(enum_set!(Ops::Shl | Ops::Shr)).src(vec![UPat::var("x"), UPat::var("y")]),
            |m, _| {
                let (x, y) = (m.get("x"), m.get("y"));
                (m.node.dtype() == x.dtype()
                    && (y.dtype() == x.dtype() || *y.dtype() == DType::UInt32))
                .into()
            },
        )
        // Integer division and remainder only exist over integers; the
        // integer case is deferred to the generic ALU rule below.
        .with(UPat::ops(enum_set!(Ops::Idiv | Ops::Mod)), |m, _| {
            if m.node.dtype().is_int() { Verdict::Abstain } else { Verdict::Reject }
        })
        // Generic ALU: every operand's base dtype equals the result's.
        .with(UPat::ops(group::ALU), |m, _| {
            let base = m.node.dtype().base();
            m.node.src().iter().all(|y| y.dtype().base() == base).into()
        })
        // Lowered ASSIGN targets an accumulator or a global.
        .with(
            UPat::op(Ops::Assign).src(vec![
                UPat::ops(enum_set!(Ops::DefineAcc | Ops::DefineGlobal)),
                UPat::any(),
            ]),
            |_, _| Verdict::Accept,
        )
        .with(
            UPat::op(Ops::EndRange).with_dtype(DType::Void).src(vec![UPat::op(Ops::Range)]),
            |_, _| Verdict::Accept,
        )
        // WMMA: <a, b, acc> with an 8-tuple shape/layout descriptor.
        .with(
            UPat::op(Ops::Wmma).src(vec![UPat::any(), UPat::any(), UPat::any()]),
            |m, _| m.node.arg().as_tuple().is_some_and(|items| items.len() == 8).into(),
        )
        // CONTRACT gathers unrolled lanes into a vector; UNROLL is its
        // inverse. Lane counts equal the product of the per-axis counts.
        .with(UPat::op(Ops::Contract), |m, _| {
            match axis_product(m.node.arg()) {
                Some(product) => (m.node.dtype().count() as i64 == product).into(),
                None => Verdict::Reject,
            }
        })
        .with(UPat::op(Ops::Unroll).src(vec![UPat::var("src")]), |m, _| {
            match axis_product(m.node.arg()) {
                Some(product) => (m.get("src").dtype().count() as i64 == product).into(),
                None => Verdict::Reject,
            }
        })
        // IF: <gate> or <gate, barrier>; ENDIF closes an IF.
        .with(UPat::op(Ops::If).with_dtype(DType::Void).src(vec![UPat::any()]), |_, _| {
            Verdict::Accept
        })
        .with(
            UPat::op(Ops::If)
                .with_dtype(DType::Void)
                .src(vec![UPat::any(), UPat::op(Ops::Barrier)]),
            |_, _| Verdict::Accept,
        )
        .with(
            UPat::op(Ops::EndIf).with_dtype(DType::Void).src(vec![UPat::op(Ops::If)]),
            |_, _| Verdict::Accept,
        )
        // REDUCE_AXIS argument: (reduction op, axes...), at least one axis,
        // reduction one of ADD/MUL/MAX.
        .with(UPat::op(Ops::ReduceAxis), |m, _| match m.node.arg().as_tuple() {
            Some(items) => (items.len() >= 2
                && matches!(items[0], Arg::Op(Ops::Add | Ops::Mul | Ops::Max)))
            .into(),
            None => Verdict::Reject,
        })
        // GEP extracts a lane: result is the source's lane-stripped dtype.
        .with(UPat::op(Ops::Gep).src(vec![UPat::var("src")]), |m, _| {
            (*m.node.dtype() == m.get("src").dtype().lane_scalar()).into()
        })
        // VECTORIZE: lane count equals source count (at least two), every
        // source vectorizes to the result dtype.
        .with(UPat::op(Ops::Vectorize), |m, _| {
            let x = m.node;
            let n = x.src().len();
            (n > 1
                && n == x.dtype().count()
                && x.src().iter().all(|y| y.dtype().vec(n) == *x.dtype()))
            .into()
        })
        .with(
            UPat::ops(enum_set!(Ops::Bitcast | Ops::Cast)).src(vec![UPat::any()]),
            |m, _| m.node.arg().is_none().into(),
        )
        // BARRIER: a local-memory fence over stores, or bare at the end of
        // a loop.
        .with(
            UPat::op(Ops::Barrier).with_dtype(DType::Void).src_all(UPat::op(Ops::Store)),
            |_, _| Verdict::Accept,
        )
        .with(UPat::op(Ops::Barrier).with_dtype(DType::Void), |_, _| Verdict::Accept)
        // SINK is permissive at this layer; the shape rules own its sources.
        .with(UPat::op(Ops::Sink).with_dtype(DType::Void), |_, _| Verdict::Accept)
        .with(
            UPat::ops(enum_set!(Ops::Noop | Ops::Custom | Ops::CustomI)),
            |_, _| Verdict::Accept,
        )
        // Backend-lowered LOAD/STORE addressing through a raw 64-bit
        // pointer value.
        .with(
            UPat::ops(enum_set!(Ops::Load | Ops::Store))
                .src_prefix(vec![UPat::any().with_dtype(DType::Int64)]),
            |_, _| Verdict::Accept,
        )
}
