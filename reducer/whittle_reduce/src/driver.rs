//! The rewrite driver: one reduction pass over an operation graph.
//!
//! The driver walks the graph in document order (stable across runs),
//! offers each operation its applicable patterns in lookup order, and
//! commits the first match. A pattern is never retried against the
//! same operation within a pass; erased operations are skipped, and
//! operations created mid-pass are not visited until the caller runs
//! another pass. Repeating passes to a fixed point — and deciding,
//! via the interestingness oracle, whether to keep the result — is the
//! surrounding delta-debugging loop's job, not the driver's.
//!
//! The pass is synchronous and single-threaded; exclusive `&mut`
//! access to the graph for its whole duration is part of the calling
//! contract (and enforced by the borrow checker).

use whittle_ir::OpGraph;

use crate::pattern::RewriteStatus;
use crate::registry::PatternSet;
use crate::rewriter::{GraphRewriter, RewriteError};

/// What one pass did, for the caller's fixed-point/budget decisions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Patterns that matched and committed an edit.
    pub matches: usize,
    /// Operations erased across all matches.
    pub ops_erased: usize,
    /// Operations created across all matches.
    pub ops_created: usize,
}

impl PassStats {
    /// Returns `true` if the pass changed nothing — the caller has
    /// reached a fixed point for this pattern set.
    pub fn is_noop(&self) -> bool {
        self.matches == 0
    }
}

/// Run one reduction pass over `graph` with the given pattern set.
///
/// On success the graph holds the reduced program; on error the pass
/// aborted at the first structural or pattern-contract violation, and
/// the graph must be considered unusable (the violating edit may be
/// partially applied).
pub fn run_pass(graph: &mut OpGraph, patterns: &PatternSet) -> Result<PassStats, RewriteError> {
    let order: Vec<_> = graph.ops().collect();
    let mut stats = PassStats::default();

    for op in order {
        // A previous match may have erased this op.
        if !graph.contains(op) {
            continue;
        }
        let kind = graph.kind(op);

        for pattern in patterns.applicable(kind) {
            let mut rewriter = GraphRewriter::new(graph);
            match pattern.match_and_rewrite(op, &mut rewriter)? {
                RewriteStatus::Matched => {
                    stats.matches += 1;
                    stats.ops_created += rewriter.ops_created();
                    stats.ops_erased += rewriter.ops_erased();
                    tracing::debug!(
                        pattern = pattern.name(),
                        op = op.raw(),
                        "applied reduction pattern",
                    );
                    break;
                }
                RewriteStatus::NoMatch => {
                    // No-match paths must leave the graph untouched.
                    if rewriter.edits() > 0 {
                        return Err(RewriteError::EditedWithoutMatch {
                            pattern: pattern.name(),
                            op,
                        });
                    }
                }
            }
        }
    }

    if !stats.is_noop() {
        tracing::debug!(
            matches = stats.matches,
            erased = stats.ops_erased,
            created = stats.ops_created,
            "reduction pass complete",
        );
    }
    Ok(stats)
}
