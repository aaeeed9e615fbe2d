//! Data model shared by filters, contexts and repositories.
//!
//! # Responsibility
//! - Define the opaque `Value` carried by predicates and native parameters.
//! - Define how caller entity types plug into the generic repository.

pub mod entity;
pub mod value;
