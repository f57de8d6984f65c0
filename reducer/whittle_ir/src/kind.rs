//! Interned operation kinds.
//!
//! An operation's kind is its discriminated semantic tag, written as a
//! `dialect.opname` string in the textual IR (`arith.add`,
//! `vector.splat`, `ub.poison`). Kinds are interned once per
//! [`Context`](crate::Context) into compact [`OpKind`] handles so that
//! pattern-registry lookups and graph traversal compare `u32`s rather
//! than strings.
//!
//! The interner is single-threaded by design: the rewrite pass owns
//! its graph and context exclusively, so the sharded concurrent
//! machinery a full compiler needs is dead weight here.

use rustc_hash::FxHashMap;

/// Interned handle for an operation kind.
///
/// Handles are only meaningful relative to the [`KindInterner`] that
/// produced them. IDs are allocated sequentially starting from 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct OpKind(u32);

impl OpKind {
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

/// String interner for operation kind names.
#[derive(Debug, Default)]
pub struct KindInterner {
    map: FxHashMap<Box<str>, OpKind>,
    names: Vec<Box<str>>,
}

impl KindInterner {
    /// Create an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a kind name, returning the existing handle if the name
    /// was seen before.
    pub fn intern(&mut self, name: &str) -> OpKind {
        if let Some(&kind) = self.map.get(name) {
            return kind;
        }
        #[allow(clippy::cast_possible_truncation)] // kind count never approaches u32::MAX
        let kind = OpKind(self.names.len() as u32);
        self.names.push(name.into());
        self.map.insert(name.into(), kind);
        kind
    }

    /// Look up a kind without interning. Returns `None` if the name
    /// has never been interned.
    pub fn get(&self, name: &str) -> Option<OpKind> {
        self.map.get(name).copied()
    }

    /// The full `dialect.opname` string for a kind.
    ///
    /// # Panics
    ///
    /// Panics if `kind` was not produced by this interner.
    pub fn name(&self, kind: OpKind) -> &str {
        &self.names[kind.index()]
    }

    /// The dialect prefix of a kind name (the part before the first
    /// `.`). Kinds without a `.` belong to the anonymous dialect and
    /// return the whole name.
    pub fn dialect_of(&self, kind: OpKind) -> &str {
        let name = self.name(kind);
        name.split_once('.').map_or(name, |(dialect, _)| dialect)
    }

    /// Number of distinct kinds interned so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no kinds have been interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
