//! Core UOp struct and graph traversal.
//!
//! A UOp is one node of an externally owned, immutable DAG: an op tag, a
//! dtype, an ordered source list and an argument payload. Nodes are shared
//! via `Arc` and may have multiple parents (diamonds are normal). The
//! verifier only ever reads this structure.
//!
//! Derived facts (strided-view descriptor, integer value range) are computed
//! lazily and cached in `OnceLock` fields, so a node list can be verified
//! concurrently with other lists without any shared mutable state.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smallvec::SmallVec;

use dozor_dtype::DType;

use crate::op::Ops;
use crate::types::Arg;
use crate::view::{Shape, Tracker};

/// Wrapper for `Arc<UOp>` that implements Hash and Eq based on stable ID.
///
/// UOp itself has no Hash/Eq (its cache fields would make them misleading);
/// this wrapper keys maps and sets by graph identity instead.
#[derive(Clone)]
pub struct UOpKey(pub Arc<UOp>);

impl std::fmt::Debug for UOpKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UOpKey(id={})", self.0.id)
    }
}

impl PartialEq for UOpKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for UOpKey {}

impl Hash for UOpKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

/// Micro-operation node in the computation graph.
#[derive(derive_more::Debug)]
pub struct UOp {
    /// Unique stable ID for this UOp instance.
    pub id: u64,
    pub(crate) op: Ops,
    pub(crate) dtype: DType,
    pub(crate) src: SmallVec<[Arc<UOp>; 4]>,
    pub(crate) arg: Arg,
    /// Cached strided-view descriptor - computed lazily on first access.
    #[debug(skip)]
    pub(crate) tracker_cache: std::sync::OnceLock<Option<Tracker>>,
    /// Cached integer value-range analysis (vmin, vmax).
    #[debug(skip)]
    pub(crate) range_cache: std::sync::OnceLock<(i64, i64)>,
}

impl UOp {
    /// Get the operation tag.
    pub fn op(&self) -> Ops {
        self.op
    }

    /// Get the data type.
    pub fn dtype(&self) -> &DType {
        &self.dtype
    }

    /// Get the ordered source list.
    pub fn src(&self) -> &[Arc<UOp>] {
        &self.src
    }

    /// Get the argument payload.
    pub fn arg(&self) -> &Arg {
        &self.arg
    }

    /// Get the base UOp by walking through shape-reinterpreting wrappers.
    ///
    /// Movement ops and single-source VIEWs describe the same data as their
    /// source; this walks down to the node that actually owns it. Malformed
    /// wrappers without a source are their own base - rules reject them
    /// elsewhere.
    pub fn base(self: &Arc<Self>) -> Arc<Self> {
        let walks = self.op.is_movement() || self.op == Ops::View;
        match self.src.first() {
            Some(first) if walks => first.base(),
            _ => self.clone(),
        }
    }

    /// Strided-view descriptor of this node, when one applies.
    ///
    /// VIEW nodes carry a descriptor in their argument; buffers report a
    /// contiguous 1-D view of their declared size; every other node inherits
    /// the first descriptor found among its sources. Shape agreement between
    /// sources is the shape rule set's concern, not this accessor's.
    pub fn tracker(self: &Arc<Self>) -> Option<&Tracker> {
        self.tracker_cache
            .get_or_init(|| match self.op {
                Ops::View => self.arg.as_view().cloned(),
                Ops::Buffer => {
                    self.arg.as_int().map(|size| Tracker::from_shape(&[size.max(0) as usize]))
                }
                _ => self.src.iter().find_map(|s| s.tracker().cloned()),
            })
            .as_ref()
    }

    /// Logical shape of this node, when one applies.
    pub fn shape(self: &Arc<Self>) -> Option<&Shape> {
        self.tracker().map(|t| t.shape())
    }

    /// The view descriptor argument of an access op's view source.
    ///
    /// Early-form LOAD/STORE carry their addressing as a VIEW second source;
    /// this returns that view's descriptor.
    pub fn view_arg(self: &Arc<Self>) -> Option<&Tracker> {
        match self.op {
            Ops::Load | Ops::Store => self.src.get(1).and_then(|v| v.arg.as_view()),
            _ => None,
        }
    }

    /// Minimum statically known value of this node (integer analysis).
    pub fn vmin(self: &Arc<Self>) -> i64 {
        self.range_cache.get_or_init(|| crate::uop::range::compute_range(self)).0
    }

    /// Maximum statically known value of this node (integer analysis).
    pub fn vmax(self: &Arc<Self>) -> i64 {
        self.range_cache.get_or_init(|| crate::uop::range::compute_range(self)).1
    }

    /// Topological sort of this node's dependency closure.
    ///
    /// Returns nodes in an order where all sources come before their
    /// consumers; `self` is last.
    pub fn toposort(self: &Arc<Self>) -> Vec<Arc<Self>> {
        let mut visited: HashSet<u64> = HashSet::new();
        let mut result = Vec::new();
        let mut stack = vec![(self.clone(), false)];

        while let Some((node, processed)) = stack.pop() {
            if visited.contains(&node.id) {
                continue;
            }

            if processed {
                visited.insert(node.id);
                result.push(node);
            } else {
                stack.push((node.clone(), true));
                for child in node.src.iter().rev() {
                    if !visited.contains(&child.id) {
                        stack.push((child.clone(), false));
                    }
                }
            }
        }

        result
    }
}
