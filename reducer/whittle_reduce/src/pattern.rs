//! The reduction-pattern contract.
//!
//! A pattern is one unit of rewrite logic: a predicate + transform
//! pair with a declared applicability scope and a tie-break priority.
//! Patterns are constructed once at registry-build time, are immutable
//! and stateless across invocations, and must be deterministic — for a
//! fixed operation and graph state, the match decision and the
//! resulting edit must be the same on every run, or minimization stops
//! being reproducible.
//!
//! # Match contract
//!
//! [`ReductionPattern::match_and_rewrite`] either returns
//! [`RewriteStatus::NoMatch`] having made *no* edit through the
//! rewriter, or returns [`RewriteStatus::Matched`] having already
//! performed exactly the structural edit it describes. The driver
//! enforces the no-edit half of this contract via the rewriter's edit
//! counter.
//!
//! Any pattern that can produce operations it would itself match must
//! refuse to match its own output, or the rewrite loop never
//! terminates. The poison-substitution rule's self-refusal
//! (`crate::poison`) is the canonical example.

use smallvec::SmallVec;

use whittle_ir::{OpId, OpKind};

use crate::rewriter::{GraphRewriter, RewriteError};

/// Priority among competing applicable patterns. Higher benefit is
/// tried first; ties are broken by registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Benefit(u16);

impl Benefit {
    /// Create a benefit from a raw priority.
    pub fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Get the raw priority.
    pub fn raw(self) -> u16 {
        self.0
    }
}

/// Declared applicability of a pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternScope {
    /// The pattern is offered every operation regardless of kind.
    Any,
    /// The pattern is offered only operations of the listed kinds.
    Kinds(SmallVec<[OpKind; 4]>),
}

impl PatternScope {
    /// Scope over a fixed set of kinds.
    pub fn kinds(kinds: impl IntoIterator<Item = OpKind>) -> Self {
        PatternScope::Kinds(kinds.into_iter().collect())
    }
}

/// Outcome of one match attempt. No-match is a normal negative
/// result, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewriteStatus {
    /// The pattern matched and its edit has been committed.
    Matched,
    /// The pattern did not apply; the graph is untouched.
    NoMatch,
}

/// One declarative match-and-replace reduction rule.
pub trait ReductionPattern {
    /// Stable debug identity, used in logs and error reports.
    fn name(&self) -> &'static str;

    /// Which operation kinds this pattern is offered.
    fn scope(&self) -> PatternScope;

    /// Tie-break priority; higher is tried first.
    fn benefit(&self) -> Benefit;

    /// Attempt to match `op` and, on success, commit the rewrite
    /// through `rewriter` before returning.
    fn match_and_rewrite(
        &self,
        op: OpId,
        rewriter: &mut GraphRewriter<'_>,
    ) -> Result<RewriteStatus, RewriteError>;
}
