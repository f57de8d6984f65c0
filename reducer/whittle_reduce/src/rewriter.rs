//! Mutation handle handed to reduction patterns.
//!
//! A [`GraphRewriter`] wraps exclusive access to an [`OpGraph`] for
//! the duration of one match attempt. All structural edits a pattern
//! makes go through it, which buys two things:
//!
//! - edits are counted, so the driver can detect a pattern that
//!   mutated the graph and then reported no match (a contract
//!   violation that would otherwise corrupt the minimization);
//! - created/erased operation counts accumulate into the pass
//!   statistics the surrounding delta-debugging loop uses to decide
//!   whether a pass made progress.
//!
//! Reads go through [`graph`](GraphRewriter::graph); there is no
//! read-side wrapping to bypass.

use thiserror::Error;

use whittle_ir::{GraphError, Loc, OpGraph, OpId, OpKind, Type, ValueRef};

/// Error aborting a rewrite pass.
///
/// Either a structural invariant violation surfaced by the graph, or
/// a pattern-contract violation detected by the engine itself. Both
/// indicate a programming defect in a pattern and are fatal to the
/// pass — they are never retried.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// The graph rejected a structural edit.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A pattern edited the graph on its no-match path.
    #[error("pattern `{pattern}` edited the graph while reporting no match on {op}")]
    EditedWithoutMatch { pattern: &'static str, op: OpId },

    /// A full-operation replacement supplied the wrong number of
    /// values.
    #[error("replacing {op}: expected {expected} replacement values, got {found}")]
    ReplacementArityMismatch {
        op: OpId,
        expected: usize,
        found: usize,
    },
}

/// Exclusive mutation handle over an operation graph.
pub struct GraphRewriter<'g> {
    graph: &'g mut OpGraph,
    edits: usize,
    created: usize,
    erased: usize,
}

impl<'g> GraphRewriter<'g> {
    /// Wrap a graph for one match attempt.
    pub fn new(graph: &'g mut OpGraph) -> Self {
        Self {
            graph,
            edits: 0,
            created: 0,
            erased: 0,
        }
    }

    /// Read-only view of the underlying graph.
    pub fn graph(&self) -> &OpGraph {
        self.graph
    }

    /// Number of structural edits made through this handle.
    pub fn edits(&self) -> usize {
        self.edits
    }

    /// Operations created through this handle.
    pub fn ops_created(&self) -> usize {
        self.created
    }

    /// Operations erased through this handle.
    pub fn ops_erased(&self) -> usize {
        self.erased
    }

    /// Create an operation immediately before `anchor` in document
    /// order.
    pub fn create_op_before(
        &mut self,
        anchor: OpId,
        kind: OpKind,
        operands: Vec<ValueRef>,
        result_types: Vec<Type>,
        loc: Loc,
    ) -> Result<OpId, RewriteError> {
        let id = self
            .graph
            .insert_before(anchor, kind, operands, result_types, loc)?;
        self.edits += 1;
        self.created += 1;
        Ok(id)
    }

    /// Reroute every use of `old` to the type-identical `new`.
    /// Returns the number of operand slots rerouted.
    pub fn replace_all_uses(
        &mut self,
        old: ValueRef,
        new: ValueRef,
    ) -> Result<usize, RewriteError> {
        let rerouted = self.graph.replace_all_uses(old, new)?;
        // Rerouting zero uses leaves the graph unchanged.
        self.edits += usize::from(rerouted > 0);
        Ok(rerouted)
    }

    /// Erase an operation whose results have no remaining uses.
    pub fn erase_op(&mut self, op: OpId) -> Result<(), RewriteError> {
        self.graph.erase(op)?;
        self.edits += 1;
        self.erased += 1;
        Ok(())
    }

    /// Replace every result of `op` with the corresponding value in
    /// `replacements`, then erase `op`. The replacement list must
    /// cover all results; use per-result
    /// [`replace_all_uses`](Self::replace_all_uses) when some results
    /// must survive.
    pub fn replace_op(&mut self, op: OpId, replacements: &[ValueRef]) -> Result<(), RewriteError> {
        let expected = self.graph.num_results(op);
        if replacements.len() != expected {
            return Err(RewriteError::ReplacementArityMismatch {
                op,
                expected,
                found: replacements.len(),
            });
        }
        for (index, &new) in replacements.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)] // result counts are tiny
            let old = self.graph.result(op, index as u32);
            self.replace_all_uses(old, new)?;
        }
        self.erase_op(op)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use whittle_ir::{GraphError, KindInterner, Loc, OpGraph, ScalarType, Type};

    use super::{GraphRewriter, RewriteError};

    const I32: Type = Type::Scalar(ScalarType::I32);

    #[test]
    fn edit_counting() {
        let mut kinds = KindInterner::new();
        let constant = kinds.intern("arith.constant");
        let add = kinds.intern("arith.add");

        let mut graph = OpGraph::new();
        let a = match graph.create_op(constant, vec![], vec![I32], Loc::UNKNOWN) {
            Ok(id) => id,
            Err(e) => panic!("create_op failed: {e}"),
        };
        let b = match graph.create_op(constant, vec![], vec![I32], Loc::UNKNOWN) {
            Ok(id) => id,
            Err(e) => panic!("create_op failed: {e}"),
        };
        let va = graph.result(a, 0);
        let vb = graph.result(b, 0);
        let sum = match graph.create_op(add, vec![va, va], vec![I32], Loc::UNKNOWN) {
            Ok(id) => id,
            Err(e) => panic!("create_op failed: {e}"),
        };

        let mut rewriter = GraphRewriter::new(&mut graph);
        assert_eq!(rewriter.edits(), 0);

        // Rerouting zero uses is not an edit.
        assert_eq!(rewriter.replace_all_uses(vb, vb), Ok(0));
        assert_eq!(rewriter.edits(), 0);

        assert_eq!(rewriter.replace_all_uses(va, vb), Ok(2));
        assert_eq!(rewriter.edits(), 1);

        assert_eq!(rewriter.erase_op(sum), Ok(()));
        assert_eq!(rewriter.edits(), 2);
        assert_eq!(rewriter.ops_erased(), 1);
        assert_eq!(rewriter.ops_created(), 0);
    }

    #[test]
    fn replace_op_arity_checked() {
        let mut kinds = KindInterner::new();
        let constant = kinds.intern("arith.constant");

        let mut graph = OpGraph::new();
        let a = match graph.create_op(constant, vec![], vec![I32, I32], Loc::UNKNOWN) {
            Ok(id) => id,
            Err(e) => panic!("create_op failed: {e}"),
        };
        let b = match graph.create_op(constant, vec![], vec![I32], Loc::UNKNOWN) {
            Ok(id) => id,
            Err(e) => panic!("create_op failed: {e}"),
        };
        let vb = graph.result(b, 0);

        let mut rewriter = GraphRewriter::new(&mut graph);
        let err = rewriter.replace_op(a, &[vb]);
        assert_eq!(
            err,
            Err(RewriteError::ReplacementArityMismatch {
                op: a,
                expected: 2,
                found: 1,
            })
        );
        // Nothing was edited by the failed call.
        assert_eq!(rewriter.edits(), 0);
        assert!(rewriter.graph().contains(a));
    }

    #[test]
    fn graph_errors_pass_through() {
        let mut kinds = KindInterner::new();
        let constant = kinds.intern("arith.constant");
        let add = kinds.intern("arith.add");

        let mut graph = OpGraph::new();
        let a = match graph.create_op(constant, vec![], vec![I32], Loc::UNKNOWN) {
            Ok(id) => id,
            Err(e) => panic!("create_op failed: {e}"),
        };
        let va = graph.result(a, 0);
        let _ = match graph.create_op(add, vec![va, va], vec![I32], Loc::UNKNOWN) {
            Ok(id) => id,
            Err(e) => panic!("create_op failed: {e}"),
        };

        let mut rewriter = GraphRewriter::new(&mut graph);
        let err = rewriter.erase_op(a);
        assert_eq!(
            err,
            Err(RewriteError::Graph(GraphError::EraseWithLiveUses {
                op: a,
                result: 0,
                uses: 2,
            }))
        );
        assert_eq!(rewriter.edits(), 0);
    }
}
