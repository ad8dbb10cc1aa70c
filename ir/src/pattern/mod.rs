//! Rule sets: ordered (pattern, predicate) pairs with indexed dispatch.
//!
//! A [`RuleSet`] tests a node against its rules in declaration order; the
//! first rule whose pattern matches *and* whose predicate does not abstain
//! decides the set's verdict. If every rule abstains (or none matches), the
//! set has no opinion on the node.
//!
//! Dispatch is indexed by op tag: each rule is registered under every op its
//! root pattern can match (rules with no op filter under all of them), so
//! judging a node only scans the rules that could possibly apply while
//! preserving their relative order.

pub mod upat;

use std::sync::Arc;

use strum::EnumCount;

use crate::op::Ops;
use crate::uop::UOp;

pub use upat::{Bindings, SrcPattern, UPat};

/// Outcome of one rule (or one whole set) for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Definitively valid.
    Accept,
    /// Definitively invalid.
    Reject,
    /// No opinion; defer to the next rule.
    Abstain,
}

impl From<bool> for Verdict {
    fn from(ok: bool) -> Self {
        if ok { Verdict::Accept } else { Verdict::Reject }
    }
}

/// A successful pattern match handed to a rule predicate.
pub struct Match<'a> {
    pub node: &'a Arc<UOp>,
    bindings: &'a Bindings,
}

impl Match<'_> {
    /// Look up a capture bound by the pattern.
    ///
    /// Panics if the name was never bound: that is a defect in the rule's
    /// own pattern, not in the graph under test.
    pub fn get(&self, name: &str) -> &Arc<UOp> {
        self.bindings
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, u)| u)
            .unwrap_or_else(|| panic!("rule pattern does not bind {name:?}"))
    }

    /// Look up a capture that the pattern binds only in some arities.
    pub fn try_get(&self, name: &str) -> Option<&Arc<UOp>> {
        self.bindings.iter().find(|(n, _)| *n == name).map(|(_, u)| u)
    }
}

/// Predicate half of a rule. `C` is caller-supplied context (the verifier
/// passes its options through here).
pub type RuleFn<C> = Box<dyn Fn(&Match<'_>, &C) -> Verdict + Send + Sync>;

struct Rule<C> {
    pattern: UPat,
    check: RuleFn<C>,
}

/// Ordered collection of rules with per-op dispatch.
pub struct RuleSet<C = ()> {
    rules: Vec<Rule<C>>,
    /// Rule indices (in declaration order) per op discriminant.
    buckets: Vec<Vec<u32>>,
}

impl<C> Default for RuleSet<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> RuleSet<C> {
    pub fn new() -> Self {
        Self { rules: Vec::new(), buckets: vec![Vec::new(); Ops::COUNT] }
    }

    /// Append a rule. Later rules only see nodes every earlier rule
    /// abstained on.
    pub fn push<F>(&mut self, pattern: UPat, check: F)
    where
        F: Fn(&Match<'_>, &C) -> Verdict + Send + Sync + 'static,
    {
        let idx = self.rules.len() as u32;
        match pattern.root_ops() {
            Some(ops) => {
                for op in ops {
                    self.buckets[op as usize].push(idx);
                }
            }
            // No op filter: the rule is a candidate for every node.
            None => {
                for bucket in &mut self.buckets {
                    bucket.push(idx);
                }
            }
        }
        self.rules.push(Rule { pattern, check: Box::new(check) });
    }

    /// Builder-style [`push`](Self::push).
    pub fn with<F>(mut self, pattern: UPat, check: F) -> Self
    where
        F: Fn(&Match<'_>, &C) -> Verdict + Send + Sync + 'static,
    {
        self.push(pattern, check);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Judge one node: first non-abstaining rule wins.
    pub fn judge(&self, node: &Arc<UOp>, ctx: &C) -> Verdict {
        for &idx in &self.buckets[node.op() as usize] {
            let rule = &self.rules[idx as usize];
            if let Some(bindings) = rule.pattern.match_first(node) {
                let verdict = (rule.check)(&Match { node, bindings: &bindings }, ctx);
                if verdict != Verdict::Abstain {
                    tracing::trace!(op = %node.op(), rule = idx, ?verdict, "rule decided");
                    return verdict;
                }
            }
        }
        Verdict::Abstain
    }
}

/// Combine two rule sets; `rhs` rules run after `self`'s.
impl<C> std::ops::Add for RuleSet<C> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        let offset = self.rules.len() as u32;
        for (op, bucket) in rhs.buckets.into_iter().enumerate() {
            self.buckets[op].extend(bucket.into_iter().map(|i| i + offset));
        }
        self.rules.extend(rhs.rules);
        self
    }
}
