use dozor_dtype::DType;
use snafu::Snafu;

use crate::op::Ops;
use crate::types::Arg;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// A node was rejected by a rule set, or no active rule set recognized
    /// it. Either way the graph producer has a bug; there is nothing to
    /// retry.
    #[snafu(display(
        "UOp verification failed at {index} on {op} {dtype:?} {} sources {src_ops:?} arg {arg:?}",
        src_ops.len()
    ))]
    VerificationFailed { index: usize, op: Ops, dtype: DType, src_ops: Vec<Ops>, arg: Arg },
}
