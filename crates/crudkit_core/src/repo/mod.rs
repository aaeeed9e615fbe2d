//! Repository layer: unit-of-work execution and the generic CRUD surface.
//!
//! # Responsibility
//! - Wrap every data operation in one unit of work.
//! - Expose entity-agnostic CRUD operations to callers.
//!
//! # Invariants
//! - Repository calls are all-or-nothing; no partial result is returned.
//! - Expected failures are values (`DataError`), never panics.

pub mod generic_repo;
pub mod unit_of_work;
