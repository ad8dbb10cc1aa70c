//! Operation tags and op groups.
//!
//! [`Ops`] is the closed enumeration of micro-operation kinds. Unlike a
//! typed-operand representation, the tag carries no arity or payload
//! information: a node is `(op, dtype, src, arg)` and every structural
//! property is checked by the rule sets, not by construction. This is what
//! lets the verifier *represent* ill-formed nodes in order to reject them.
//!
//! Op groups are [`EnumSet`] constants, so rules can express "any ALU op" or
//! "everything except SINK" with plain set algebra.

use enumset::{EnumSet, enum_set};

/// Micro-operation kind.
#[derive(Debug, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumCount, strum::EnumIter, strum::VariantArray)]
#[derive(enumset::EnumSetType)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[enumset(repr = "u128")]
pub enum Ops {
    // Graph identity / placement markers
    Unique,
    Device,
    Noop,

    // Memory definitions
    DefineGlobal,
    DefineLocal,
    DefineAcc,
    DefineVar,
    Special,

    // Buffers and the descriptor layer above them
    Buffer,
    BufferView,
    Kernel,
    Assign,
    Copy,

    // Data movement between logical shapes
    Reshape,
    Permute,
    Expand,
    Pad,
    Shrink,
    Flip,

    // Tensor-graph wrappers
    Detach,
    Contiguous,
    ContiguousBackward,
    Fuse,

    // Strided-view plumbing
    View,
    Valid,

    // Values
    Const,
    Bind,

    // Memory access
    Index,
    Load,
    Store,

    // Control flow
    Range,
    EndRange,
    If,
    EndIf,
    Barrier,
    Sink,

    // Reductions
    ReduceAxis,

    // Vectors and accelerator ops
    Gep,
    Vectorize,
    Wmma,
    Contract,
    Unroll,

    // Type conversion
    Cast,
    Bitcast,

    // Escape hatches
    Custom,
    CustomI,

    // ALU: unary
    Exp2,
    Log2,
    Sin,
    Sqrt,
    Recip,
    Neg,
    Trunc,

    // ALU: binary
    Add,
    Sub,
    Mul,
    Fdiv,
    Idiv,
    Mod,
    Max,
    Pow,
    Cmplt,
    Cmpne,
    Xor,
    Or,
    And,
    Shl,
    Shr,
    Threefry,

    // ALU: ternary
    Where,
    MulAcc,
}

/// Op groups, mirroring the closed families the rules quantify over.
pub mod group {
    use super::*;

    pub const UNARY: EnumSet<Ops> = enum_set!(
        Ops::Exp2 | Ops::Log2 | Ops::Sin | Ops::Sqrt | Ops::Recip | Ops::Neg | Ops::Trunc
    );

    pub const BINARY: EnumSet<Ops> = enum_set!(
        Ops::Add
            | Ops::Sub
            | Ops::Mul
            | Ops::Fdiv
            | Ops::Idiv
            | Ops::Mod
            | Ops::Max
            | Ops::Pow
            | Ops::Cmplt
            | Ops::Cmpne
            | Ops::Xor
            | Ops::Or
            | Ops::And
            | Ops::Shl
            | Ops::Shr
            | Ops::Threefry
    );

    pub const TERNARY: EnumSet<Ops> = enum_set!(Ops::Where | Ops::MulAcc);

    pub const ALU: EnumSet<Ops> = enum_set!(
        Ops::Exp2
            | Ops::Log2
            | Ops::Sin
            | Ops::Sqrt
            | Ops::Recip
            | Ops::Neg
            | Ops::Trunc
            | Ops::Add
            | Ops::Sub
            | Ops::Mul
            | Ops::Fdiv
            | Ops::Idiv
            | Ops::Mod
            | Ops::Max
            | Ops::Pow
            | Ops::Cmplt
            | Ops::Cmpne
            | Ops::Xor
            | Ops::Or
            | Ops::And
            | Ops::Shl
            | Ops::Shr
            | Ops::Threefry
            | Ops::Where
            | Ops::MulAcc
    );

    pub const MOVEMENT: EnumSet<Ops> =
        enum_set!(Ops::Reshape | Ops::Permute | Ops::Expand | Ops::Pad | Ops::Shrink | Ops::Flip);

    /// Wrappers that pass their single source through unchanged.
    pub const PASSTHROUGH: EnumSet<Ops> =
        enum_set!(Ops::Detach | Ops::Contiguous | Ops::ContiguousBackward | Ops::Fuse);

    /// Every op kind.
    pub fn all() -> EnumSet<Ops> {
        EnumSet::all()
    }
}

impl Ops {
    /// Whether this op is in the generic ALU family.
    pub fn is_alu(&self) -> bool {
        group::ALU.contains(*self)
    }

    /// Whether this op reinterprets its source's logical shape.
    pub fn is_movement(&self) -> bool {
        group::MOVEMENT.contains(*self)
    }
}
