//! Convenience re-exports for verifier callers.

pub use crate::error::{Error, Result};
pub use crate::op::{Ops, group};
pub use crate::pattern::{RuleSet, UPat, Verdict};
pub use crate::types::{Arg, Kernel};
pub use crate::uop::UOp;
pub use crate::verify::{
    VerifyOptions, verify_kernel_graph, verify_ops, verify_sched_graph, verify_tensor_graph,
};
pub use crate::view::{Tracker, View};

pub use dozor_dtype::{AddrSpace, DType, ImageKind, ScalarDType};
