//! Dialect participation in reduction.
//!
//! Dialects contribute reduction patterns without the engine knowing
//! about them ahead of time:
//!
//! 1. a contributor registers a [`DialectRegistry`] extension for its
//!    dialect (see [`register_vector_reduction`] for the reference
//!    contributor);
//! 2. when that dialect is loaded into a [`Context`], the extension
//!    runs once, interns whatever kinds it needs, and attaches a
//!    [`ReductionPatternProvider`] interface to the dialect;
//! 3. [`collect_reduction_patterns`] walks the loaded dialects in load
//!    order, asks every attached provider to populate a
//!    [`PatternSetBuilder`], and freezes the result.
//!
//! Because extension application is idempotent per (extension,
//! dialect) pair, loading a dialect twice — or appending the same
//! registry before and after loading — never duplicates patterns, and
//! collecting from the same context twice yields identically ordered
//! sets.

use whittle_ir::{Context, DialectRegistry, OpKind};

use crate::poison::PoisonSubstitution;
use crate::registry::{PatternSet, PatternSetBuilder, RegistryError};

/// One dialect's reduction-pattern contribution.
pub trait DialectReductionPatterns {
    /// Add this dialect's patterns to the session's set.
    fn populate(&self, builder: &mut PatternSetBuilder);
}

/// Concrete interface object attached to a [`whittle_ir::Dialect`];
/// the wrapper gives the `dyn Any` interface
/// map a single queryable type while contributors stay free to attach
/// any [`DialectReductionPatterns`] implementation.
pub struct ReductionPatternProvider(Box<dyn DialectReductionPatterns>);

impl ReductionPatternProvider {
    /// Wrap a contribution for attachment to a dialect.
    pub fn new(patterns: impl DialectReductionPatterns + 'static) -> Self {
        Self(Box::new(patterns))
    }

    /// Forward to the wrapped contribution.
    pub fn populate(&self, builder: &mut PatternSetBuilder) {
        self.0.populate(builder);
    }
}

/// Build the pattern set for a context from every loaded dialect's
/// attached providers. Dialects are visited in load order and each
/// dialect's providers in attachment order, so two collections from
/// the same context produce identically ordered sets.
pub fn collect_reduction_patterns(ctx: &Context) -> Result<PatternSet, RegistryError> {
    let mut builder = PatternSetBuilder::new();
    for id in ctx.dialects() {
        let dialect = ctx.dialect(id);
        for provider in dialect.interfaces::<ReductionPatternProvider>() {
            provider.populate(&mut builder);
        }
    }
    tracing::debug!(patterns = builder.len(), "collected reduction patterns");
    builder.build()
}

/// The `vector` dialect's contribution: poison substitution over
/// vector-typed results.
struct VectorReductionPatterns {
    poison: OpKind,
}

impl DialectReductionPatterns for VectorReductionPatterns {
    fn populate(&self, builder: &mut PatternSetBuilder) {
        builder.add(PoisonSubstitution::for_vectors(self.poison));
    }
}

/// Register the reference reduction extension: when the `vector`
/// dialect loads, intern the `ub.poison` marker kind and attach the
/// vector poison-substitution contribution.
pub fn register_vector_reduction(registry: &mut DialectRegistry) {
    registry.add_extension("vector", |ctx, dialect| {
        let poison = ctx.kinds_mut().intern("ub.poison");
        ctx.dialect_mut(dialect)
            .attach_interface(ReductionPatternProvider::new(VectorReductionPatterns {
                poison,
            }));
    });
}
