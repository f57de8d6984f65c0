//! Pattern set construction and kind-indexed lookup.
//!
//! A [`PatternSetBuilder`] accumulates patterns from any number of
//! contributors in registration order; [`build`](PatternSetBuilder::build)
//! validates the contributions and freezes them into a [`PatternSet`]
//! indexed for amortized-constant lookup by operation kind.
//!
//! Validation happens only at build time — malformed registrations are
//! [`RegistryError`]s here, and runtime lookups never fail. Within
//! each lookup bucket, patterns are ordered by descending benefit with
//! registration order breaking ties, and exact-kind patterns are
//! offered before wildcard ones.

use std::cmp::Reverse;

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use whittle_ir::OpKind;

use crate::pattern::{PatternScope, ReductionPattern};

/// Configuration error detected while freezing a pattern set.
///
/// Reported at build time, never at rewrite time.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A pattern declared an explicit kind scope with no kinds in it.
    /// Such a pattern could never be offered any operation, which is
    /// always a registration mistake.
    #[error("pattern `{pattern}` declares an explicit kind scope with no kinds")]
    EmptyKindScope { pattern: &'static str },
}

/// Ordered accumulator for pattern contributions.
#[derive(Default)]
pub struct PatternSetBuilder {
    patterns: Vec<Box<dyn ReductionPattern>>,
}

impl PatternSetBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern. Registration order is significant: it breaks
    /// benefit ties during lookup.
    pub fn add(&mut self, pattern: impl ReductionPattern + 'static) {
        self.patterns.push(Box::new(pattern));
    }

    /// Number of patterns added so far.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if no patterns have been added.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Validate and freeze the contributions into a queryable set.
    pub fn build(self) -> Result<PatternSet, RegistryError> {
        let mut by_kind: FxHashMap<OpKind, Vec<usize>> = FxHashMap::default();
        let mut any_op: Vec<usize> = Vec::new();

        for (index, pattern) in self.patterns.iter().enumerate() {
            match pattern.scope() {
                PatternScope::Any => any_op.push(index),
                PatternScope::Kinds(kinds) => {
                    if kinds.is_empty() {
                        return Err(RegistryError::EmptyKindScope {
                            pattern: pattern.name(),
                        });
                    }
                    // A pattern listing a kind twice is registered
                    // under it once.
                    let mut seen = FxHashSet::default();
                    for kind in kinds {
                        if seen.insert(kind) {
                            by_kind.entry(kind).or_default().push(index);
                        }
                    }
                }
            }
        }

        // Stable sort: descending benefit, registration order on ties.
        let benefit = |&i: &usize| Reverse(self.patterns[i].benefit());
        for bucket in by_kind.values_mut() {
            bucket.sort_by_key(benefit);
        }
        any_op.sort_by_key(benefit);

        Ok(PatternSet {
            patterns: self.patterns,
            by_kind,
            any_op,
        })
    }
}

/// Frozen, kind-indexed pattern collection. Read-only during a
/// rewrite pass.
pub struct PatternSet {
    patterns: Vec<Box<dyn ReductionPattern>>,
    by_kind: FxHashMap<OpKind, Vec<usize>>,
    any_op: Vec<usize>,
}

impl PatternSet {
    /// Total number of patterns in the set.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if the set holds no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Patterns applicable to an operation of `kind`, in trial order:
    /// exact-kind patterns first, then wildcard patterns, each group
    /// by descending benefit with registration order breaking ties.
    pub fn applicable(&self, kind: OpKind) -> impl Iterator<Item = &dyn ReductionPattern> + '_ {
        let exact = self.by_kind.get(&kind).map_or(&[][..], Vec::as_slice);
        exact
            .iter()
            .chain(self.any_op.iter())
            .map(move |&i| self.patterns[i].as_ref())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use smallvec::smallvec;

    use whittle_ir::{KindInterner, OpId, OpKind};

    use crate::pattern::{Benefit, PatternScope, ReductionPattern, RewriteStatus};
    use crate::rewriter::{GraphRewriter, RewriteError};

    use super::{PatternSetBuilder, RegistryError};

    /// Inert pattern with a configurable scope and benefit; never
    /// matches. Lookup-order tests only need its identity.
    struct Probe {
        name: &'static str,
        scope: PatternScope,
        benefit: Benefit,
    }

    impl ReductionPattern for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn scope(&self) -> PatternScope {
            self.scope.clone()
        }

        fn benefit(&self) -> Benefit {
            self.benefit
        }

        fn match_and_rewrite(
            &self,
            _op: OpId,
            _rewriter: &mut GraphRewriter<'_>,
        ) -> Result<RewriteStatus, RewriteError> {
            Ok(RewriteStatus::NoMatch)
        }
    }

    fn probe(name: &'static str, scope: PatternScope, benefit: u16) -> Probe {
        Probe {
            name,
            scope,
            benefit: Benefit::new(benefit),
        }
    }

    fn applicable_names(
        set: &super::PatternSet,
        kind: OpKind,
    ) -> Vec<&'static str> {
        set.applicable(kind).map(ReductionPattern::name).collect()
    }

    fn build(builder: PatternSetBuilder) -> super::PatternSet {
        match builder.build() {
            Ok(set) => set,
            Err(e) => panic!("build failed: {e}"),
        }
    }

    #[test]
    fn exact_kind_before_wildcard() {
        let mut kinds = KindInterner::new();
        let add = kinds.intern("arith.add");

        let mut builder = PatternSetBuilder::new();
        builder.add(probe("wild", PatternScope::Any, 10));
        builder.add(probe("exact", PatternScope::kinds([add]), 1));
        let set = build(builder);

        // The exact-kind pattern comes first despite its lower benefit.
        assert_eq!(applicable_names(&set, add), vec!["exact", "wild"]);
    }

    #[test]
    fn benefit_orders_within_group() {
        let mut kinds = KindInterner::new();
        let add = kinds.intern("arith.add");

        let mut builder = PatternSetBuilder::new();
        builder.add(probe("low", PatternScope::kinds([add]), 1));
        builder.add(probe("high", PatternScope::kinds([add]), 5));
        builder.add(probe("mid", PatternScope::kinds([add]), 3));
        let set = build(builder);

        assert_eq!(applicable_names(&set, add), vec!["high", "mid", "low"]);
    }

    #[test]
    fn registration_order_breaks_ties() {
        let mut kinds = KindInterner::new();
        let add = kinds.intern("arith.add");

        let mut builder = PatternSetBuilder::new();
        builder.add(probe("first", PatternScope::kinds([add]), 2));
        builder.add(probe("second", PatternScope::kinds([add]), 2));
        builder.add(probe("third", PatternScope::Any, 2));
        builder.add(probe("fourth", PatternScope::Any, 2));
        let set = build(builder);

        assert_eq!(
            applicable_names(&set, add),
            vec!["first", "second", "third", "fourth"],
        );
    }

    #[test]
    fn unknown_kind_gets_only_wildcards() {
        let mut kinds = KindInterner::new();
        let add = kinds.intern("arith.add");
        let splat = kinds.intern("vector.splat");

        let mut builder = PatternSetBuilder::new();
        builder.add(probe("exact", PatternScope::kinds([add]), 1));
        builder.add(probe("wild", PatternScope::Any, 1));
        let set = build(builder);

        assert_eq!(applicable_names(&set, splat), vec!["wild"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn duplicate_kinds_in_scope_deduplicated() {
        let mut kinds = KindInterner::new();
        let add = kinds.intern("arith.add");

        let mut builder = PatternSetBuilder::new();
        builder.add(probe("dup", PatternScope::Kinds(smallvec![add, add]), 1));
        let set = build(builder);

        assert_eq!(applicable_names(&set, add), vec!["dup"]);
    }

    #[test]
    fn empty_kind_scope_rejected_at_build() {
        let mut builder = PatternSetBuilder::new();
        builder.add(probe("broken", PatternScope::Kinds(smallvec![]), 1));
        let err = builder.build().err();
        assert_eq!(
            err,
            Some(RegistryError::EmptyKindScope { pattern: "broken" }),
        );
    }

    #[test]
    fn rebuild_is_deterministic() {
        let mut kinds = KindInterner::new();
        let add = kinds.intern("arith.add");
        let splat = kinds.intern("vector.splat");

        let make = || {
            let mut builder = PatternSetBuilder::new();
            builder.add(probe("a", PatternScope::kinds([add, splat]), 2));
            builder.add(probe("b", PatternScope::Any, 2));
            builder.add(probe("c", PatternScope::kinds([splat]), 4));
            build(builder)
        };

        let first = make();
        let second = make();
        for kind in [add, splat] {
            assert_eq!(applicable_names(&first, kind), applicable_names(&second, kind));
        }
    }
}
