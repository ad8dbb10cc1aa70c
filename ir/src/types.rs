//! Argument payloads and auxiliary node data.
//!
//! [`Arg`] is deliberately loose: the payload attached to a node is whatever
//! the graph producer put there, and the rule sets decide whether its runtime
//! kind is acceptable for the op. Encoding per-op payload types in the type
//! system would make malformed graphs unrepresentable - and the rules that
//! reject them untestable dead code.

use std::sync::Arc;

use dozor_dtype::DType;

use crate::op::Ops;
use crate::uop::UOp;
use crate::view::Tracker;

/// Compiled-program descriptor attached to a KERNEL node.
///
/// `ast` is the root of the program the kernel realizes. Its root op is a
/// producer-side invariant checked fatally by the structure rules.
#[derive(Debug, Clone)]
pub struct Kernel {
    pub ast: Arc<UOp>,
}

impl Kernel {
    pub fn new(ast: Arc<UOp>) -> Self {
        Self { ast }
    }
}

impl PartialEq for Kernel {
    fn eq(&self, other: &Self) -> bool {
        self.ast.id == other.ast.id
    }
}

/// Operator-specific argument payload.
#[derive(Debug, Clone, Default)]
pub enum Arg {
    /// No argument.
    #[default]
    None,
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Device-name string or hardware-special-id name.
    Str(String),
    /// An op kind embedded in a payload (reduction identity element).
    Op(Ops),
    /// A node reference (symbolic extents/offsets).
    Node(Arc<UOp>),
    /// Heterogeneous tuple.
    Tuple(Vec<Arg>),
    /// Strided-view descriptor carried by VIEW nodes.
    View(Tracker),
    /// Compiled-program descriptor carried by KERNEL nodes.
    Kernel(Kernel),
}

impl PartialEq for Arg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Arg::None, Arg::None) => true,
            (Arg::Int(a), Arg::Int(b)) => a == b,
            (Arg::Float(a), Arg::Float(b)) => a == b,
            (Arg::Bool(a), Arg::Bool(b)) => a == b,
            (Arg::Str(a), Arg::Str(b)) => a == b,
            (Arg::Op(a), Arg::Op(b)) => a == b,
            // Node references compare by graph identity.
            (Arg::Node(a), Arg::Node(b)) => a.id == b.id,
            (Arg::Tuple(a), Arg::Tuple(b)) => a == b,
            (Arg::View(a), Arg::View(b)) => a == b,
            (Arg::Kernel(a), Arg::Kernel(b)) => a == b,
            _ => false,
        }
    }
}

/// Runtime kind of a constant payload, for dtype/constant agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstKind {
    Int,
    Float,
    Bool,
}

impl Arg {
    /// Build a tuple of integers.
    pub fn ints<I: IntoIterator<Item = i64>>(values: I) -> Self {
        Arg::Tuple(values.into_iter().map(Arg::Int).collect())
    }

    /// Build a pair.
    pub fn pair(a: Arg, b: Arg) -> Self {
        Arg::Tuple(vec![a, b])
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Arg::None)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Arg::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Arg::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Arg]> {
        match self {
            Arg::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_view(&self) -> Option<&Tracker> {
        match self {
            Arg::View(tracker) => Some(tracker),
            _ => None,
        }
    }

    pub fn as_kernel(&self) -> Option<&Kernel> {
        match self {
            Arg::Kernel(kernel) => Some(kernel),
            _ => None,
        }
    }

    /// Runtime kind of this payload, if it is a constant-like value.
    pub fn const_kind(&self) -> Option<ConstKind> {
        match self {
            Arg::Int(_) => Some(ConstKind::Int),
            Arg::Float(_) => Some(ConstKind::Float),
            Arg::Bool(_) => Some(ConstKind::Bool),
            _ => None,
        }
    }

    /// The constant kind a value of `dtype` coerces to.
    ///
    /// This is the verifier's half of constant coercion: a CONST payload is
    /// well-kinded iff its runtime kind equals what coercion to the node's
    /// dtype would produce. Void (and other non-value dtypes) coerce to
    /// nothing.
    pub fn const_kind_for(dtype: &DType) -> Option<ConstKind> {
        let base = dtype.base();
        if base.is_bool() {
            Some(ConstKind::Bool)
        } else if base.is_int() {
            Some(ConstKind::Int)
        } else if base.is_float() {
            Some(ConstKind::Float)
        } else {
            None
        }
    }
}
