//! Engine-agnostic criteria algebra.
//!
//! # Responsibility
//! - Accumulate predicates and AND/OR groups through a fluent builder.
//! - Stay free of execution: translation to SQL lives in `db::translate`.
//!
//! # Invariants
//! - Filters are append-only; there is no removal operation.
//! - Equal criteria collapse, so predicate order and repetition never change
//!   what a filter matches.

pub mod builder;
pub mod predicate;

pub use builder::Filter;
pub use predicate::{Criterion, Junction, Predicate, PredicateKind, ID_PROPERTY};
