//! Verification driver and named rule-set compositions.
//!
//! The driver walks an externally produced, already topologically sorted
//! node list and judges every node against the active rule sets. The
//! low-level op rules are always active; callers add the compositions
//! matching the pipeline stage they are checking:
//!
//! - [`kernel_graph_rules`] - buffer topology + assign/kernel structure,
//!   layered under the low-level rules for fully lowered kernels.
//! - [`tensor_graph_rules`] - topology + structure + tensor-level semantics.
//! - [`sched_graph_rules`] - topology + structure, with every other op
//!   rejected at top level (the scheduler graph only carries buffers,
//!   assigns and kernels).
//! - [`shape_rules`] - broadcast-shape agreement, composable with any of
//!   the above.
//!
//! A node fails when any active set rejects it, or when every active set
//! abstains - an unrecognized node shape is itself an error.

pub mod assign;
pub mod bounds;
pub mod buffer;
pub mod ops;
pub mod shape;
pub mod tensor;

use std::sync::Arc;
use std::sync::OnceLock;

use smallvec::SmallVec;

use crate::error::{Result, VerificationFailedSnafu};
use crate::pattern::{RuleSet, Verdict};
use crate::uop::UOp;
use crate::uop::debug::dump_uops;

/// Rule set specialized to the verifier's context.
pub type Rules = RuleSet<VerifyOptions>;

/// Explicit verifier configuration.
///
/// Passed by value into every rule evaluation so verification stays pure
/// and testable; [`VerifyOptions::from_env`] exists for callers that want
/// the process-environment escape hatches.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions {
    /// Disable the static out-of-bounds check entirely.
    pub ignore_oob: bool,
    /// Diagnostic verbosity. `>= 1` logs out-of-bounds details, `>= 3`
    /// dumps the full node list before a failure is raised.
    pub debug: u8,
}

impl VerifyOptions {
    /// Read the configuration from `DOZOR_IGNORE_OOB` / `DOZOR_DEBUG`.
    pub fn from_env() -> Self {
        let num = |name: &str| {
            std::env::var(name).ok().and_then(|v| v.parse::<u8>().ok()).unwrap_or(0)
        };
        Self { ignore_oob: num("DOZOR_IGNORE_OOB") != 0, debug: num("DOZOR_DEBUG") }
    }
}

/// Low-level op rules, always active in the driver.
pub fn op_rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(ops::rules)
}

/// Buffer topology rules on their own.
pub fn buffer_rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(buffer::rules)
}

/// Assign/kernel structure rules on their own.
pub fn assign_rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(assign::rules)
}

/// Topology + structure, for fully lowered kernel graphs.
pub fn kernel_graph_rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| buffer::rules() + assign::rules())
}

/// Topology + structure + tensor-level semantics.
pub fn tensor_graph_rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| buffer::rules() + assign::rules() + tensor::rules())
}

/// Topology + structure, everything else rejected at top level.
pub fn sched_graph_rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| buffer::rules() + assign::rules() + sched_reject_rules())
}

/// Broadcast-shape agreement across a whole graph.
pub fn shape_rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(shape::rules)
}

/// The scheduler graph admits only buffers, assigns and kernels; anything
/// the topology/structure rules did not already accept is rejected, except
/// the SINK that roots the graph.
fn sched_reject_rules() -> Rules {
    use crate::op::{Ops, group};
    use crate::pattern::UPat;

    RuleSet::new().with(UPat::ops(group::all() - Ops::Sink), |_, _| Verdict::Reject)
}

/// Verify a topologically sorted node list against the low-level op rules
/// plus the given extra sets.
///
/// Halts at the first failing node with a diagnostic naming its position,
/// op, dtype, source ops and argument.
pub fn verify_ops(uops: &[Arc<UOp>], extra: &[&Rules], opts: &VerifyOptions) -> Result<()> {
    for (index, node) in uops.iter().enumerate() {
        let mut verdicts: SmallVec<[Verdict; 4]> = SmallVec::new();
        verdicts.push(op_rules().judge(node, opts));
        for set in extra {
            verdicts.push(set.judge(node, opts));
        }

        let rejected = verdicts.contains(&Verdict::Reject);
        let undecided = verdicts.iter().all(|v| *v == Verdict::Abstain);
        if rejected || undecided {
            if opts.debug >= 3 {
                tracing::error!("node list before failure:\n{}", dump_uops(uops));
            }
            return VerificationFailedSnafu {
                index,
                op: node.op(),
                dtype: node.dtype().clone(),
                src_ops: node.src().iter().map(|s| s.op()).collect::<Vec<_>>(),
                arg: node.arg().clone(),
            }
            .fail();
        }
    }
    Ok(())
}

/// Verify a fully lowered kernel node list.
pub fn verify_kernel_graph(uops: &[Arc<UOp>], opts: &VerifyOptions) -> Result<()> {
    verify_ops(uops, &[kernel_graph_rules()], opts)
}

/// Verify a tensor-level node list.
pub fn verify_tensor_graph(uops: &[Arc<UOp>], opts: &VerifyOptions) -> Result<()> {
    verify_ops(uops, &[tensor_graph_rules()], opts)
}

/// Verify a scheduler node list.
pub fn verify_sched_graph(uops: &[Arc<UOp>], opts: &VerifyOptions) -> Result<()> {
    verify_ops(uops, &[sched_graph_rules()], opts)
}
