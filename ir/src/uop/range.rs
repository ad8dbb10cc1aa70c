//! Integer value-range analysis (vmin/vmax).
//!
//! Bottom-up, conservative propagation of statically known bounds through
//! the arithmetic that index expressions are made of. When an op is outside
//! the supported set, the analysis falls back to the node's dtype bounds -
//! never narrower than the truth, so the bounds check that consumes these
//! values can only err in the accepting direction.
//!
//! All arithmetic saturates; unrepresentable extremes degrade to dtype
//! bounds rather than wrapping.

use std::sync::Arc;

use dozor_dtype::DType;

use crate::op::Ops;
use crate::types::Arg;
use crate::uop::UOp;

/// Widest representable range for a node of this dtype.
fn dtype_bounds(dtype: &DType) -> (i64, i64) {
    dtype.base().int_bounds().unwrap_or((i64::MIN, i64::MAX))
}

/// Floor division, defined for a positive divisor.
fn div_floor(a: i64, b: i64) -> i64 {
    a.div_euclid(b)
}

/// Compute the (vmin, vmax) bounds of a node.
pub(crate) fn compute_range(uop: &Arc<UOp>) -> (i64, i64) {
    let fallback = dtype_bounds(uop.dtype());

    match uop.op() {
        Ops::Const => match uop.arg() {
            Arg::Int(v) => (*v, *v),
            Arg::Bool(b) => {
                let v = *b as i64;
                (v, v)
            }
            _ => fallback,
        },

        // A bound variable ranges over its definition's bounds.
        Ops::Bind => uop.src().first().map_or(fallback, |var| (var.vmin(), var.vmax())),

        Ops::DefineVar => match uop.arg().as_tuple() {
            Some([_, Arg::Int(min), Arg::Int(max)]) if min <= max => (*min, *max),
            _ => fallback,
        },

        // SPECIAL(name, extent) counts 0..extent.
        Ops::Special => match uop.arg().as_tuple() {
            Some([_, Arg::Int(extent), ..]) if *extent > 0 => (0, extent - 1),
            _ => fallback,
        },

        // RANGE(start, end) iterates [start, end).
        Ops::Range => match uop.src() {
            [start, end] if start.vmin() < end.vmax() => {
                (start.vmin(), end.vmax().saturating_sub(1))
            }
            _ => fallback,
        },

        Ops::Add => binary(uop, fallback, |(a0, a1), (b0, b1)| {
            (a0.saturating_add(b0), a1.saturating_add(b1))
        }),

        Ops::Sub => binary(uop, fallback, |(a0, a1), (b0, b1)| {
            (a0.saturating_sub(b1), a1.saturating_sub(b0))
        }),

        Ops::Mul => binary(uop, fallback, |(a0, a1), (b0, b1)| {
            let products =
                [a0.saturating_mul(b0), a0.saturating_mul(b1), a1.saturating_mul(b0), a1.saturating_mul(b1)];
            (*products.iter().min().unwrap(), *products.iter().max().unwrap())
        }),

        Ops::Max => binary(uop, fallback, |(a0, a1), (b0, b1)| (a0.max(b0), a1.max(b1))),

        Ops::Mod => binary(uop, fallback, |(a0, a1), (b0, b1)| {
            if b0 <= 0 {
                return fallback;
            }
            if a0 >= 0 {
                (0, a1.min(b1 - 1))
            } else {
                (-(b1 - 1), b1 - 1)
            }
        }),

        Ops::Idiv => binary(uop, fallback, |(a0, a1), (b0, b1)| {
            if b0 <= 0 {
                return fallback;
            }
            let quotients =
                [div_floor(a0, b0), div_floor(a0, b1), div_floor(a1, b0), div_floor(a1, b1)];
            (*quotients.iter().min().unwrap(), *quotients.iter().max().unwrap())
        }),

        Ops::Neg => match uop.src() {
            [x] => (x.vmax().saturating_neg(), x.vmin().saturating_neg()),
            _ => fallback,
        },

        // Selection ranges over the union of its branches.
        Ops::Where => match uop.src() {
            [_, t, f] => (t.vmin().min(f.vmin()), t.vmax().max(f.vmax())),
            _ => fallback,
        },

        // Value-preserving cast: keep source bounds when they fit the target,
        // otherwise assume nothing.
        Ops::Cast => match uop.src() {
            [x] => {
                let (lo, hi) = (x.vmin(), x.vmax());
                if lo >= fallback.0 && hi <= fallback.1 { (lo, hi) } else { fallback }
            }
            _ => fallback,
        },

        // Lane shuffles never produce values outside their sources.
        Ops::Gep => match uop.src() {
            [x] => (x.vmin(), x.vmax()),
            _ => fallback,
        },
        Ops::Vectorize if !uop.src().is_empty() => {
            let lo = uop.src().iter().map(|s| s.vmin()).min().unwrap();
            let hi = uop.src().iter().map(|s| s.vmax()).max().unwrap();
            (lo, hi)
        }

        Ops::And => binary(uop, fallback, |(a0, a1), (b0, b1)| {
            if a0 >= 0 && b0 >= 0 { (0, a1.min(b1)) } else { fallback }
        }),

        _ => fallback,
    }
}

/// Apply `f` to the two source ranges of a binary node.
fn binary(
    uop: &Arc<UOp>,
    fallback: (i64, i64),
    f: impl Fn((i64, i64), (i64, i64)) -> (i64, i64),
) -> (i64, i64) {
    match uop.src() {
        [a, b] => f((a.vmin(), a.vmax()), (b.vmin(), b.vmax())),
        _ => fallback,
    }
}
