//! Dialects, contexts, and the lazy dialect-extension registry.
//!
//! A dialect is a named family of operation kinds sharing semantics
//! (`arith`, `vector`, `ub`, ...). Dialects are loaded into a
//! [`Context`], which owns the kind interner and everything else that
//! is per-reduction-session state.
//!
//! # Extension protocol
//!
//! External contributors attach behavior to a dialect *without the
//! core knowing about them* via [`DialectRegistry::add_extension`]:
//! a callback keyed by dialect name, invoked exactly once per
//! (extension, dialect) pair at the moment that dialect becomes
//! present in the context — whether the dialect loads after the
//! registry is appended or was already loaded when it arrives. The
//! callback typically interns the kinds it needs and attaches an
//! interface object to the dialect (see
//! [`Dialect::attach_interface`]), which a later collection step
//! queries by type.
//!
//! Deferring the callback until load time means pattern construction
//! happens only when the relevant dialect's kinds actually exist in
//! the context, and dialects unknown to the core can participate.

use std::any::Any;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::KindInterner;

// ── Dialects ────────────────────────────────────────────────────────

/// Handle for a dialect loaded into a [`Context`].
///
/// IDs are allocated sequentially in load order, starting from 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct DialectId(u32);

impl DialectId {
    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A loaded dialect: its name plus an open map of attached interface
/// objects, queried by concrete type.
pub struct Dialect {
    name: Box<str>,
    interfaces: Vec<Box<dyn Any>>,
}

impl Dialect {
    fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            interfaces: Vec::new(),
        }
    }

    /// The dialect's name (`"vector"`, `"ub"`, ...).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach an interface object. Multiple interfaces of different
    /// types may coexist; [`interface`](Self::interface) returns the
    /// first attachment of the requested type.
    pub fn attach_interface<T: 'static>(&mut self, interface: T) {
        self.interfaces.push(Box::new(interface));
    }

    /// Query an attached interface by type.
    pub fn interface<T: 'static>(&self) -> Option<&T> {
        self.interfaces.iter().find_map(|i| i.downcast_ref::<T>())
    }

    /// All attached interfaces of a type, in attachment order.
    /// Distinct contributors may attach the same interface type to
    /// one dialect.
    pub fn interfaces<T: 'static>(&self) -> impl Iterator<Item = &T> + '_ {
        self.interfaces.iter().filter_map(|i| i.downcast_ref::<T>())
    }
}

impl std::fmt::Debug for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialect")
            .field("name", &self.name)
            .field("interfaces", &self.interfaces.len())
            .finish()
    }
}

// ── Extension registry ──────────────────────────────────────────────

type ExtensionFn = dyn Fn(&mut Context, DialectId);

/// An ordered collection of dialect extensions, assembled by callers
/// and appended to a [`Context`] before a reduction session begins.
#[derive(Default)]
pub struct DialectRegistry {
    extensions: Vec<(Box<str>, Rc<ExtensionFn>)>,
}

impl DialectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback to run when `dialect` is loaded into a
    /// context this registry has been appended to.
    pub fn add_extension(
        &mut self,
        dialect: &str,
        apply: impl Fn(&mut Context, DialectId) + 'static,
    ) {
        self.extensions.push((dialect.into(), Rc::new(apply)));
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Returns `true` if no extensions are registered.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

// ── Context ─────────────────────────────────────────────────────────

struct ExtensionEntry {
    /// Context-unique ID; the applied-set is keyed on it so merging
    /// further registries cannot re-run earlier extensions.
    id: u64,
    dialect: Box<str>,
    apply: Rc<ExtensionFn>,
}

/// Per-session owner of the kind interner, the loaded dialects, and
/// the merged extension registry.
///
/// A context is single-threaded state: extension registration and
/// dialect loading happen strictly before a rewrite pass runs, and a
/// pass holds the context and its graph exclusively.
#[derive(Default)]
pub struct Context {
    kinds: KindInterner,
    dialects: Vec<Dialect>,
    by_name: FxHashMap<Box<str>, DialectId>,
    extensions: Vec<ExtensionEntry>,
    applied: FxHashSet<(u64, DialectId)>,
    next_extension_id: u64,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// The context's kind interner.
    pub fn kinds(&self) -> &KindInterner {
        &self.kinds
    }

    /// Mutable access to the kind interner (for interning new kinds,
    /// typically from extension callbacks).
    pub fn kinds_mut(&mut self) -> &mut KindInterner {
        &mut self.kinds
    }

    /// Merge a registry's extensions into this context and apply any
    /// whose dialect is already loaded. Each (extension, dialect) pair
    /// is applied at most once for the lifetime of the context.
    pub fn append_registry(&mut self, registry: DialectRegistry) {
        for (dialect, apply) in registry.extensions {
            let id = self.next_extension_id;
            self.next_extension_id += 1;
            self.extensions.push(ExtensionEntry { id, dialect, apply });
        }
        self.apply_pending();
    }

    /// Load a dialect by name, triggering any matching extensions on
    /// first load. Loading an already-loaded dialect returns the
    /// existing handle and runs nothing.
    pub fn load_dialect(&mut self, name: &str) -> DialectId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        #[allow(clippy::cast_possible_truncation)] // dialect count is tiny
        let id = DialectId(self.dialects.len() as u32);
        self.dialects.push(Dialect::new(name));
        self.by_name.insert(name.into(), id);
        self.apply_pending();
        id
    }

    /// Handle of a loaded dialect, if present.
    pub fn get_dialect(&self, name: &str) -> Option<DialectId> {
        self.by_name.get(name).copied()
    }

    /// Loaded dialects in load order.
    pub fn dialects(&self) -> impl Iterator<Item = DialectId> + '_ {
        #[allow(clippy::cast_possible_truncation)] // dialect count is tiny
        let count = self.dialects.len() as u32;
        (0..count).map(DialectId)
    }

    /// A loaded dialect.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this context.
    pub fn dialect(&self, id: DialectId) -> &Dialect {
        &self.dialects[id.index()]
    }

    /// Mutable access to a loaded dialect.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this context.
    pub fn dialect_mut(&mut self, id: DialectId) -> &mut Dialect {
        &mut self.dialects[id.index()]
    }

    /// Run every not-yet-applied extension whose dialect is loaded.
    ///
    /// Pairs are marked applied before the callback runs, so callbacks
    /// that load further dialects or append further registries cannot
    /// re-enter themselves. A recursive call may drain pairs that are
    /// still in an outer call's snapshot, so the applied-set is
    /// re-checked at invocation, not just at snapshot time.
    fn apply_pending(&mut self) {
        let mut pending = Vec::new();
        for ext in &self.extensions {
            if let Some(&id) = self.by_name.get(&*ext.dialect) {
                if !self.applied.contains(&(ext.id, id)) {
                    pending.push((ext.id, id, Rc::clone(&ext.apply)));
                }
            }
        }
        for (ext_id, dialect_id, apply) in pending {
            if self.applied.insert((ext_id, dialect_id)) {
                apply(self, dialect_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::{Context, DialectRegistry};

    /// Interface type used by the tests below.
    struct Marker(u32);

    #[test]
    fn load_dialect_is_idempotent() {
        let mut ctx = Context::new();
        let a = ctx.load_dialect("vector");
        let b = ctx.load_dialect("vector");
        assert_eq!(a, b);
        assert_eq!(ctx.dialects().count(), 1);
    }

    #[test]
    fn extension_runs_on_load() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);

        let mut registry = DialectRegistry::new();
        registry.add_extension("vector", move |ctx, dialect| {
            seen.set(seen.get() + 1);
            let poison = ctx.kinds_mut().intern("ub.poison");
            ctx.dialect_mut(dialect).attach_interface(Marker(poison.raw()));
        });

        let mut ctx = Context::new();
        ctx.append_registry(registry);
        assert_eq!(calls.get(), 0);

        let vector = ctx.load_dialect("vector");
        assert_eq!(calls.get(), 1);
        assert!(ctx.dialect(vector).interface::<Marker>().is_some());

        // Reloading does not re-run the extension.
        ctx.load_dialect("vector");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn extension_runs_for_already_loaded_dialect() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);

        let mut ctx = Context::new();
        ctx.load_dialect("vector");

        let mut registry = DialectRegistry::new();
        registry.add_extension("vector", move |_, _| seen.set(seen.get() + 1));
        ctx.append_registry(registry);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn extension_for_unloaded_dialect_never_runs() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);

        let mut registry = DialectRegistry::new();
        registry.add_extension("vector", move |_, _| seen.set(seen.get() + 1));

        let mut ctx = Context::new();
        ctx.append_registry(registry);
        ctx.load_dialect("arith");
        assert_eq!(calls.get(), 0);
        assert_eq!(ctx.get_dialect("vector"), None);
    }

    #[test]
    fn callback_loading_another_dialect_applies_each_pair_once() {
        // The first extension's callback loads a second dialect, which
        // recurses into extension application while the second
        // extension is still pending in the outer call.
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);

        let mut registry = DialectRegistry::new();
        registry.add_extension("vector", |ctx, _| {
            ctx.load_dialect("arith");
        });
        registry.add_extension("vector", move |_, _| seen.set(seen.get() + 1));

        let mut ctx = Context::new();
        ctx.append_registry(registry);
        ctx.load_dialect("vector");
        assert_eq!(calls.get(), 1);
        assert!(ctx.get_dialect("arith").is_some());
    }

    #[test]
    fn extensions_for_same_dialect_run_in_registration_order() {
        let log = Rc::new(std::cell::RefCell::new(Vec::new()));

        let mut registry = DialectRegistry::new();
        for tag in [1u32, 2, 3] {
            let log = Rc::clone(&log);
            registry.add_extension("vector", move |_, _| log.borrow_mut().push(tag));
        }

        let mut ctx = Context::new();
        ctx.append_registry(registry);
        ctx.load_dialect("vector");
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn interface_query_by_type() {
        let mut ctx = Context::new();
        let ub = ctx.load_dialect("ub");
        ctx.dialect_mut(ub).attach_interface(Marker(7));

        let marker = ctx.dialect(ub).interface::<Marker>();
        assert!(matches!(marker, Some(Marker(7))));
        assert!(ctx.dialect(ub).interface::<String>().is_none());
        assert_eq!(ctx.dialect(ub).name(), "ub");
    }
}
