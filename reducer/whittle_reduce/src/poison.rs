//! Poison substitution — the canonical "erase this computation, keep
//! its type" reduction rule.
//!
//! Any operation producing at least one result whose type satisfies
//! the rule's qualification predicate is rewritten: each qualifying
//! result's uses are rerouted to a freshly created poison marker of
//! the identical type, inserted at the original operation's position
//! and carrying its location. A poison marker asserts "this value is
//! deliberately unspecified, of this type" — it has one result and no
//! operands, so poisoning detaches the matched operation from its
//! whole input subtree while every downstream consumer keeps seeing
//! the type it expects. The program stays well-typed, which keeps it
//! eligible for the interestingness oracle.
//!
//! # Partial results
//!
//! A multi-result operation whose result types only partly qualify is
//! *not* erased: its non-qualifying results have no other producer, so
//! the operation stays alive with those uses intact, and only the
//! qualifying results are rerouted. Erasure happens exactly when every
//! result was replaced.
//!
//! # Termination
//!
//! The rule refuses to match poison markers themselves. Its output is
//! the one thing it could otherwise match forever.

use whittle_ir::{OpId, OpKind, Type};

use crate::pattern::{Benefit, PatternScope, ReductionPattern, RewriteStatus};
use crate::rewriter::{GraphRewriter, RewriteError};

/// Wildcard reduction rule replacing qualifying results with poison
/// markers.
///
/// The qualification predicate is a parameter of the pattern family:
/// the reference instantiation ([`for_vectors`](Self::for_vectors))
/// qualifies vector types, but a dialect may instantiate the same rule
/// over any type classification it wants reduced toward poison.
pub struct PoisonSubstitution {
    poison_kind: OpKind,
    benefit: Benefit,
    qualifies: fn(&Type) -> bool,
}

impl PoisonSubstitution {
    /// Create a poison-substitution rule.
    ///
    /// `poison_kind` is the marker operation kind (one result, no
    /// operands); `qualifies` decides which result types are replaced.
    /// The predicate is a plain function pointer so the pattern stays
    /// stateless and deterministic.
    pub fn new(poison_kind: OpKind, benefit: Benefit, qualifies: fn(&Type) -> bool) -> Self {
        Self {
            poison_kind,
            benefit,
            qualifies,
        }
    }

    /// The reference instantiation: poison every vector-typed result.
    pub fn for_vectors(poison_kind: OpKind) -> Self {
        Self::new(poison_kind, Benefit::new(1), Type::is_vector)
    }
}

impl ReductionPattern for PoisonSubstitution {
    fn name(&self) -> &'static str {
        "poison-substitution"
    }

    fn scope(&self) -> PatternScope {
        PatternScope::Any
    }

    fn benefit(&self) -> Benefit {
        self.benefit
    }

    fn match_and_rewrite(
        &self,
        op: OpId,
        rewriter: &mut GraphRewriter<'_>,
    ) -> Result<RewriteStatus, RewriteError> {
        let graph = rewriter.graph();

        // Never match our own output.
        if graph.kind(op) == self.poison_kind {
            return Ok(RewriteStatus::NoMatch);
        }
        let result_types: Vec<Type> = graph.result_types(op).to_vec();
        if !result_types.iter().any(|ty| (self.qualifies)(ty)) {
            return Ok(RewriteStatus::NoMatch);
        }

        let loc = graph.loc(op);
        if result_types.iter().all(|ty| (self.qualifies)(ty)) {
            // Every result qualifies: swap the whole operation for its
            // markers and erase it.
            let mut markers = Vec::with_capacity(result_types.len());
            for ty in &result_types {
                let marker =
                    rewriter.create_op_before(op, self.poison_kind, vec![], vec![*ty], loc)?;
                markers.push(rewriter.graph().result(marker, 0));
            }
            rewriter.replace_op(op, &markers)?;
            return Ok(RewriteStatus::Matched);
        }

        // Mixed results: reroute the qualifying ones and keep the
        // operation alive as the producer of the rest.
        for (index, ty) in result_types.iter().enumerate() {
            if !(self.qualifies)(ty) {
                continue;
            }
            let marker =
                rewriter.create_op_before(op, self.poison_kind, vec![], vec![*ty], loc)?;
            #[allow(clippy::cast_possible_truncation)] // result counts are tiny
            let old = rewriter.graph().result(op, index as u32);
            let new = rewriter.graph().result(marker, 0);
            rewriter.replace_all_uses(old, new)?;
        }
        Ok(RewriteStatus::Matched)
    }
}
