//! Reduction engine for the Whittle IR minimizer.
//!
//! Given an IR program that triggers a bug, the surrounding
//! delta-debugging tool searches for a smaller variant that still
//! triggers it. This crate is the generic rewriting substrate that
//! search runs on:
//!
//! - **Patterns** ([`ReductionPattern`], [`Benefit`], [`PatternScope`]):
//!   declarative match-and-replace rules over arbitrary operation
//!   kinds.
//! - **Pattern set** ([`PatternSetBuilder`], [`PatternSet`]): ordered,
//!   de-duplicated, kind-indexed collection assembled from multiple
//!   contributors; validated at build time, infallible at lookup time.
//! - **Driver** ([`run_pass`], [`PassStats`]): one deterministic
//!   rewrite pass over an operation graph, committing the first
//!   applicable match per operation.
//! - **Poison substitution** ([`PoisonSubstitution`]): the canonical
//!   reduction rule: replace a computation's qualifying results with
//!   type-matching `ub.poison` markers, keeping the program well-typed
//!   while erasing what produced the values.
//! - **Dialect extension point** ([`register_vector_reduction`],
//!   [`DialectReductionPatterns`], [`collect_reduction_patterns`]):
//!   the protocol through which each dialect contributes its own rules
//!   when it is loaded, without the engine depending on it.
//!
//! # Pipeline Position
//!
//! ```text
//! parse → [register extensions → load dialects → collect patterns]
//!       → run_pass (repeat to fixed point / budget)
//!       → print → interestingness oracle (external)
//! ```
//!
//! Deciding *which* reduced candidate to keep is the external
//! delta-debugging loop's job; this crate only performs the rewrites
//! and reports what changed.
//!
//! # Crate Dependencies
//!
//! `whittle_reduce` depends on `whittle_ir` for the operation graph,
//! kinds, types, and the dialect/context machinery. It never parses,
//! prints, or executes programs.

pub mod driver;
pub mod extension;
pub mod pattern;
pub mod poison;
pub mod registry;
pub mod rewriter;

pub use driver::{run_pass, PassStats};
pub use extension::{
    collect_reduction_patterns, register_vector_reduction, DialectReductionPatterns,
    ReductionPatternProvider,
};
pub use pattern::{Benefit, PatternScope, ReductionPattern, RewriteStatus};
pub use poison::PoisonSubstitution;
pub use registry::{PatternSet, PatternSetBuilder, RegistryError};
pub use rewriter::{GraphRewriter, RewriteError};
