//! UPat structural patterns.
//!
//! A UPat matches one node by op tag (one or a set), dtype, and source
//! structure, optionally binding matched nodes to names the rule predicate
//! reads back. Patterns are built once when a rule set is constructed and
//! matched many times, so construction ergonomics favor a fluent builder.
//!
//! The dtype filter is lane-aware: asking for `bool` also matches a vector
//! of bools, since rules quantify over lanes implicitly.

use std::sync::Arc;

use enumset::EnumSet;
use smallvec::SmallVec;

use dozor_dtype::DType;

use crate::op::Ops;
use crate::uop::UOp;

/// Named captures produced by a successful match.
pub type Bindings = SmallVec<[(&'static str, Arc<UOp>); 4]>;

/// Pattern over a node's source list.
#[derive(Debug, Clone)]
pub enum SrcPattern {
    /// Exactly these patterns, one per source.
    Exact(Vec<UPat>),
    /// At least these patterns; trailing sources are unconstrained.
    Prefix(Vec<UPat>),
    /// Every source matches this one pattern (any count, including zero).
    All(Box<UPat>),
}

/// Structural pattern over a single node.
#[derive(Debug, Clone, Default)]
pub struct UPat {
    op: Option<EnumSet<Ops>>,
    dtype: Option<Vec<DType>>,
    src: Option<SrcPattern>,
    name: Option<&'static str>,
}

impl UPat {
    /// Match any node.
    pub fn any() -> Self {
        Self::default()
    }

    /// Match any node and bind it.
    pub fn var(name: &'static str) -> Self {
        Self::any().named(name)
    }

    /// Match one op kind.
    pub fn op(op: Ops) -> Self {
        Self { op: Some(EnumSet::only(op)), ..Self::default() }
    }

    /// Match any op kind in a set.
    pub fn ops(ops: EnumSet<Ops>) -> Self {
        Self { op: Some(ops), ..Self::default() }
    }

    /// Bind the matched node to a name.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Constrain the dtype (lane-aware: a vector matches its scalar's filter).
    pub fn with_dtype(self, dtype: DType) -> Self {
        self.with_dtypes(vec![dtype])
    }

    /// Constrain the dtype to any of the given (lane-aware).
    pub fn with_dtypes(mut self, dtypes: Vec<DType>) -> Self {
        self.dtype = Some(dtypes);
        self
    }

    /// Require exactly these sources.
    pub fn src(mut self, patterns: Vec<UPat>) -> Self {
        self.src = Some(SrcPattern::Exact(patterns));
        self
    }

    /// Require zero sources.
    pub fn src_empty(self) -> Self {
        self.src(vec![])
    }

    /// Require at least these sources; extra trailing sources are fine.
    pub fn src_prefix(mut self, patterns: Vec<UPat>) -> Self {
        self.src = Some(SrcPattern::Prefix(patterns));
        self
    }

    /// Require every source to match one pattern.
    pub fn src_all(mut self, pattern: UPat) -> Self {
        self.src = Some(SrcPattern::All(Box::new(pattern)));
        self
    }

    /// The op kinds this pattern can match at its root, `None` for any.
    pub(crate) fn root_ops(&self) -> Option<EnumSet<Ops>> {
        self.op
    }

    /// Match this pattern against a node, returning captures on success.
    pub fn match_first(&self, uop: &Arc<UOp>) -> Option<Bindings> {
        let mut bindings = Bindings::new();
        self.match_into(uop, &mut bindings).then_some(bindings)
    }

    fn match_into(&self, uop: &Arc<UOp>, bindings: &mut Bindings) -> bool {
        if let Some(ops) = self.op
            && !ops.contains(uop.op())
        {
            return false;
        }

        if let Some(dtypes) = &self.dtype
            && !dtypes.iter().any(|d| *d == *uop.dtype() || *d == uop.dtype().lane_scalar())
        {
            return false;
        }

        if let Some(name) = self.name {
            match bindings.iter().find(|(n, _)| *n == name) {
                // A name bound twice must refer to the same node.
                Some((_, existing)) => {
                    if existing.id != uop.id {
                        return false;
                    }
                }
                None => bindings.push((name, uop.clone())),
            }
        }

        match &self.src {
            None => true,
            Some(SrcPattern::Exact(patterns)) => {
                uop.src().len() == patterns.len()
                    && uop.src().iter().zip(patterns).all(|(s, p)| p.match_into(s, bindings))
            }
            Some(SrcPattern::Prefix(patterns)) => {
                uop.src().len() >= patterns.len()
                    && uop.src().iter().zip(patterns).all(|(s, p)| p.match_into(s, bindings))
            }
            Some(SrcPattern::All(pattern)) => {
                uop.src().iter().all(|s| pattern.match_into(s, bindings))
            }
        }
    }
}
