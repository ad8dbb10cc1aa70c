//! Assign/kernel structure rules.
//!
//! The write-target layer built atop buffers: KERNEL descriptors attached to
//! ASSIGNs, and the assign dependency chains between possibly-aliased
//! buffers.
//!
//! The kernel-descriptor invariants are asserted, not judged: a descriptor
//! whose program root is not COPY/BUFFER_VIEW/SINK (or a SINK that collects
//! non-STOREs) is an internal-consistency bug in the graph producer, and the
//! run terminates immediately rather than reporting a user-graph diagnostic.

use enumset::enum_set;

use crate::op::Ops;
use crate::pattern::{Match, RuleSet, UPat, Verdict};
use crate::verify::{Rules, VerifyOptions};

fn validate_kernel(m: &Match<'_>, _opts: &VerifyOptions) -> Verdict {
    let Some(kernel) = m.node.arg().as_kernel() else {
        return Verdict::Reject;
    };

    let root = kernel.ast.op();
    assert!(
        matches!(root, Ops::Copy | Ops::BufferView | Ops::Sink),
        "kernel descriptor must end with SINK/COPY/BUFFER_VIEW, got {root}"
    );
    if root == Ops::Sink {
        assert!(
            kernel.ast.src().iter().all(|s| s.op() == Ops::Store),
            "kernel SINK must collect only STOREs"
        );
    }
    Verdict::Accept
}

pub(crate) fn rules() -> Rules {
    RuleSet::new()
        // A KERNEL describes the compute required to realize a buffer; it
        // may only depend on buffers, buffer views and other assigns.
        .with(
            UPat::op(Ops::Kernel)
                .src_all(UPat::ops(enum_set!(Ops::Buffer | Ops::BufferView | Ops::Assign))),
            validate_kernel,
        )
        // An ASSIGN writes a value to a buffer target; sources beyond the
        // first two are dependency links to other assigns.
        .with(UPat::op(Ops::Assign), |m, _| {
            let src = m.node.src();
            let Some(target) = src.first() else {
                return Verdict::Reject;
            };
            let target_ok = matches!(target.base().op(), Ops::Buffer | Ops::BufferView);
            (target_ok && (src.len() == 2 || src[2..].iter().all(|s| s.op() == Ops::Assign)))
                .into()
        })
}
