//! Mutable use-def operation graph.
//!
//! The graph is the substrate every reduction pattern rewrites. It is
//! arena-backed: operations live in slots addressed by stable
//! [`OpId`]s, and erasing an operation tombstones its slot rather than
//! shifting anything, so an `OpId` held by a not-yet-visited traversal
//! step can never dangle — at worst it refers to a dead slot, which
//! every accessor and mutation checks for.
//!
//! # Structure
//!
//! - **[`OpId`]**: stable arena index of one operation.
//! - **[`ValueRef`]**: one typed result slot of an operation
//!   (`op` + result index); the graph's notion of an SSA value.
//! - **[`UseSite`]**: a back-reference from a value to one operand
//!   slot that reads it.
//! - **[`OpGraph`]**: the arena, a document-order list (the stable
//!   traversal order rewrite passes walk), and an incrementally
//!   maintained reverse use map.
//!
//! # Mutation contract
//!
//! All structural edits go through [`create_op`](OpGraph::create_op),
//! [`insert_before`](OpGraph::insert_before),
//! [`replace_all_uses`](OpGraph::replace_all_uses) and
//! [`erase`](OpGraph::erase). The mutators enforce the two invariants
//! rewrites depend on: uses are only ever rerouted between values of
//! equal type, and an operation cannot be erased while any of its
//! results still has live uses. Violations are [`GraphError`]s, not
//! silent corruption.
//!
//! The graph is mutated in place and is not internally synchronized;
//! a rewrite pass requires exclusive `&mut` access for its duration.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{Loc, OpKind, Type};

// ── ID and reference types ──────────────────────────────────────────

/// Stable arena index of an operation.
///
/// IDs are allocated sequentially and never reused; erased operations
/// leave a tombstone behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct OpId(u32);

impl OpId {
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

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op{}", self.0)
    }
}

/// A single typed result slot of an operation — the graph's SSA value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueRef {
    /// The producing operation.
    pub op: OpId,
    /// Result index within the producer.
    pub index: u32,
}

impl ValueRef {
    /// Create a reference to result `index` of `op`.
    pub fn new(op: OpId, index: u32) -> Self {
        Self { op, index }
    }
}

impl fmt::Display for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.op, self.index)
    }
}

/// Back-reference from a value to one operand slot reading it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UseSite {
    /// The operation reading the value.
    pub user: OpId,
    /// Operand index within the user.
    pub operand: u32,
}

// ── Errors ──────────────────────────────────────────────────────────

/// Structural error raised by a graph mutation.
///
/// These indicate a programming defect in the caller (usually a
/// misbehaving rewrite pattern) and abort the surrounding pass; the
/// graph is never left silently malformed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The operation slot is erased or was never allocated.
    #[error("{op} is erased or does not exist")]
    DeadOp { op: OpId },

    /// An operand names a dead producer or an out-of-range result.
    #[error("operand {value} refers to a dead or invalid result")]
    DeadOperand { value: ValueRef },

    /// Use replacement between values of unequal type.
    #[error("cannot replace uses of {old} ({old_ty}) with {new} ({new_ty}): types differ")]
    ReplaceTypeMismatch {
        old: ValueRef,
        new: ValueRef,
        old_ty: Type,
        new_ty: Type,
    },

    /// Erasure of an operation whose results still have uses.
    #[error("cannot erase {op}: result #{result} still has {uses} live uses")]
    EraseWithLiveUses { op: OpId, result: u32, uses: usize },
}

// ── Operation storage ───────────────────────────────────────────────

/// Payload of one live operation slot.
#[derive(Debug)]
struct OpData {
    kind: OpKind,
    operands: Vec<ValueRef>,
    results: SmallVec<[Type; 2]>,
    loc: Loc,
}

/// Arena-backed operation graph with use tracking.
#[derive(Debug, Default)]
pub struct OpGraph {
    /// Operation slots; `None` marks a tombstone left by erasure.
    slots: Vec<Option<OpData>>,
    /// Live operations in document order.
    order: Vec<OpId>,
    /// Reverse use map: value → operand slots reading it.
    uses: FxHashMap<ValueRef, Vec<UseSite>>,
}

impl OpGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Introspection ───────────────────────────────────────────────

    /// Returns `true` if `op` is live (allocated and not erased).
    pub fn contains(&self, op: OpId) -> bool {
        self.data(op).is_some()
    }

    /// Number of live operations.
    pub fn op_count(&self) -> usize {
        self.order.len()
    }

    /// Live operations in document order. The order is stable across
    /// runs: creation order, adjusted only by explicit
    /// [`insert_before`](Self::insert_before) calls.
    pub fn ops(&self) -> impl Iterator<Item = OpId> + '_ {
        self.order.iter().copied()
    }

    /// Kind of a live operation.
    ///
    /// # Panics
    ///
    /// Panics if `op` is dead.
    pub fn kind(&self, op: OpId) -> OpKind {
        self.expect_data(op).kind
    }

    /// Location of a live operation.
    ///
    /// # Panics
    ///
    /// Panics if `op` is dead.
    pub fn loc(&self, op: OpId) -> Loc {
        self.expect_data(op).loc
    }

    /// Operands of a live operation, in order.
    ///
    /// # Panics
    ///
    /// Panics if `op` is dead.
    pub fn operands(&self, op: OpId) -> &[ValueRef] {
        &self.expect_data(op).operands
    }

    /// Result types of a live operation, in order.
    ///
    /// # Panics
    ///
    /// Panics if `op` is dead.
    pub fn result_types(&self, op: OpId) -> &[Type] {
        &self.expect_data(op).results
    }

    /// Number of results of a live operation.
    ///
    /// # Panics
    ///
    /// Panics if `op` is dead.
    pub fn num_results(&self, op: OpId) -> usize {
        self.expect_data(op).results.len()
    }

    /// Reference to result `index` of a live operation.
    ///
    /// # Panics
    ///
    /// Panics if `op` is dead or `index` is out of range.
    pub fn result(&self, op: OpId, index: u32) -> ValueRef {
        let data = self.expect_data(op);
        assert!(
            (index as usize) < data.results.len(),
            "result #{index} out of range for {op}",
        );
        ValueRef::new(op, index)
    }

    /// Type of a value.
    ///
    /// # Panics
    ///
    /// Panics if the producing operation is dead or the result index
    /// is out of range.
    pub fn value_type(&self, value: ValueRef) -> Type {
        self.expect_data(value.op).results[value.index as usize]
    }

    /// Returns `true` if `value` names a live result slot.
    pub fn is_live_value(&self, value: ValueRef) -> bool {
        self.data(value.op)
            .is_some_and(|data| (value.index as usize) < data.results.len())
    }

    /// Use sites currently reading `value`, in no particular order.
    pub fn uses_of(&self, value: ValueRef) -> &[UseSite] {
        self.uses.get(&value).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if any result of `op` has at least one use.
    ///
    /// # Panics
    ///
    /// Panics if `op` is dead.
    pub fn has_uses(&self, op: OpId) -> bool {
        (0..self.num_results(op)).any(|i| {
            #[allow(clippy::cast_possible_truncation)] // result counts are tiny
            let value = ValueRef::new(op, i as u32);
            !self.uses_of(value).is_empty()
        })
    }

    // ── Mutation ────────────────────────────────────────────────────

    /// Create an operation at the end of the document order.
    ///
    /// Every operand must name a live result; the new operation's
    /// use sites are recorded immediately.
    pub fn create_op(
        &mut self,
        kind: OpKind,
        operands: Vec<ValueRef>,
        result_types: Vec<Type>,
        loc: Loc,
    ) -> Result<OpId, GraphError> {
        let id = self.alloc(kind, operands, result_types, loc)?;
        self.order.push(id);
        Ok(id)
    }

    /// Create an operation immediately before `anchor` in document
    /// order. This is how replacements keep the position of the
    /// operation they stand in for.
    pub fn insert_before(
        &mut self,
        anchor: OpId,
        kind: OpKind,
        operands: Vec<ValueRef>,
        result_types: Vec<Type>,
        loc: Loc,
    ) -> Result<OpId, GraphError> {
        if !self.contains(anchor) {
            return Err(GraphError::DeadOp { op: anchor });
        }
        let id = self.alloc(kind, operands, result_types, loc)?;
        // The anchor is live, so it is present in the order list.
        let pos = self
            .order
            .iter()
            .position(|&o| o == anchor)
            .unwrap_or(self.order.len());
        self.order.insert(pos, id);
        Ok(id)
    }

    /// Reroute every use of `old` to `new`. The two values must have
    /// equal types — use replacement never changes the type observed
    /// at any use site.
    ///
    /// Returns the number of operand slots rerouted. Replacing a value
    /// with itself is a no-op.
    pub fn replace_all_uses(&mut self, old: ValueRef, new: ValueRef) -> Result<usize, GraphError> {
        if !self.is_live_value(old) {
            return Err(GraphError::DeadOperand { value: old });
        }
        if !self.is_live_value(new) {
            return Err(GraphError::DeadOperand { value: new });
        }
        if old == new {
            return Ok(0);
        }
        let old_ty = self.value_type(old);
        let new_ty = self.value_type(new);
        if old_ty != new_ty {
            return Err(GraphError::ReplaceTypeMismatch {
                old,
                new,
                old_ty,
                new_ty,
            });
        }

        let sites = self.uses.remove(&old).unwrap_or_default();
        let count = sites.len();
        for site in &sites {
            // Use sites are maintained alongside operand lists, so the
            // user is live and the operand slot holds `old`.
            if let Some(data) = self.slots[site.user.index()].as_mut() {
                data.operands[site.operand as usize] = new;
            }
        }
        self.uses.entry(new).or_default().extend(sites);
        Ok(count)
    }

    /// Erase a live operation with no remaining uses.
    ///
    /// The operation's own operand use sites are dropped; its slot is
    /// tombstoned and it leaves the document order.
    pub fn erase(&mut self, op: OpId) -> Result<(), GraphError> {
        let data = match self.data(op) {
            Some(data) => data,
            None => return Err(GraphError::DeadOp { op }),
        };
        for result in 0..data.results.len() {
            #[allow(clippy::cast_possible_truncation)] // result counts are tiny
            let result = result as u32;
            let live = self.uses_of(ValueRef::new(op, result)).len();
            if live > 0 {
                return Err(GraphError::EraseWithLiveUses {
                    op,
                    result,
                    uses: live,
                });
            }
        }

        // Invariants hold; commit. Taking the slot tombstones it.
        let data = self.slots[op.index()].take();
        if let Some(data) = data {
            for (i, operand) in data.operands.iter().enumerate() {
                #[allow(clippy::cast_possible_truncation)] // operand counts are tiny
                let site = UseSite {
                    user: op,
                    operand: i as u32,
                };
                if let Some(sites) = self.uses.get_mut(operand) {
                    sites.retain(|s| *s != site);
                    if sites.is_empty() {
                        self.uses.remove(operand);
                    }
                }
            }
        }
        self.order.retain(|&o| o != op);
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────

    fn data(&self, op: OpId) -> Option<&OpData> {
        self.slots.get(op.index()).and_then(Option::as_ref)
    }

    /// # Panics
    ///
    /// Panics if `op` is dead. Accessors require a live operation;
    /// callers traverse via [`ops`](Self::ops) or check
    /// [`contains`](Self::contains) first.
    fn expect_data(&self, op: OpId) -> &OpData {
        match self.data(op) {
            Some(data) => data,
            None => panic!("{op} is erased or does not exist"),
        }
    }

    /// Allocate a slot and record operand use sites. Does not touch
    /// the order list.
    fn alloc(
        &mut self,
        kind: OpKind,
        operands: Vec<ValueRef>,
        result_types: Vec<Type>,
        loc: Loc,
    ) -> Result<OpId, GraphError> {
        for &operand in &operands {
            if !self.is_live_value(operand) {
                return Err(GraphError::DeadOperand { value: operand });
            }
        }
        #[allow(clippy::cast_possible_truncation)] // op count never approaches u32::MAX
        let id = OpId(self.slots.len() as u32);
        for (i, operand) in operands.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)] // operand counts are tiny
            let site = UseSite {
                user: id,
                operand: i as u32,
            };
            self.uses.entry(*operand).or_default().push(site);
        }
        self.slots.push(Some(OpData {
            kind,
            operands,
            results: result_types.into(),
            loc,
        }));
        Ok(id)
    }
}
