//! Operation-graph substrate for the Whittle IR reducer.
//!
//! This crate provides everything the reduction core consumes from the
//! host IR:
//!
//! - **Types** ([`Type`], [`ScalarType`]): immutable value
//!   classifiers, including the vector types the reference reduction
//!   rule targets.
//! - **Kinds** ([`OpKind`], [`KindInterner`]): interned
//!   `dialect.opname` tags identifying an operation's semantics.
//! - **Graph** ([`OpGraph`], [`OpId`], [`ValueRef`], [`UseSite`]):
//!   an arena-backed mutable use-def graph with an explicit mutation
//!   API (create/insert, replace-all-uses, erase) that enforces
//!   structural invariants via [`GraphError`] instead of corrupting
//!   the graph.
//! - **Dialects** ([`Context`], [`Dialect`], [`DialectRegistry`]):
//!   per-session state plus the lazy extension protocol that lets
//!   external contributors (such as `whittle_reduce`'s reduction
//!   patterns) attach behavior when a dialect is loaded.
//!
//! # Crate Dependencies
//!
//! Depends only on `rustc-hash`, `smallvec`, and `thiserror`. The
//! reduction engine itself lives in `whittle_reduce`.

pub mod dialect;
pub mod graph;
pub mod kind;
pub mod loc;
pub mod ty;

pub use dialect::{Context, Dialect, DialectId, DialectRegistry};
pub use graph::{GraphError, OpGraph, OpId, UseSite, ValueRef};
pub use kind::{KindInterner, OpKind};
pub use loc::Loc;
pub use ty::{ScalarType, Type};
