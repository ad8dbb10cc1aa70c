//! UOp graph representation and well-formedness verification.
//!
//! This crate decides whether a directed acyclic graph of typed
//! micro-operations (UOps) is well-formed before it is lowered to executable
//! code. The graph arrives externally built and topologically sorted; the
//! verifier only accepts or rejects it, with a diagnostic naming the first
//! offending node - it never repairs or rewrites anything.
//!
//! # Module Organization
//!
//! - [`op`] - closed operation enumeration and op groups
//! - [`types`] - argument payloads and the kernel descriptor
//! - [`view`] - strided-view descriptors consumed from the stride library
//! - [`uop`] - the UOp node, constructors and derived facts
//! - [`pattern`] - UPat structural patterns and verdict rule sets
//! - [`verify`] - the rule collections and the verification driver
//! - [`error`] - error types and result handling

pub mod error;
pub mod op;
pub mod pattern;
pub mod prelude;
pub mod types;
pub mod uop;
pub mod verify;
pub mod view;

#[cfg(test)]
mod test;

pub use error::{Error, Result};
pub use op::{Ops, group};
pub use pattern::{Bindings, Match, RuleSet, UPat, Verdict};
pub use types::{Arg, ConstKind, Kernel};
pub use uop::{UOp, UOpKey};
pub use verify::{
    VerifyOptions, kernel_graph_rules, op_rules, sched_graph_rules, shape_rules,
    tensor_graph_rules, verify_kernel_graph, verify_ops, verify_sched_graph,
    verify_tensor_graph,
};
pub use view::{Shape, Tracker, View};

// Re-export external types for convenience
pub use dozor_dtype::{AddrSpace, DType, ImageKind, ScalarDType};
