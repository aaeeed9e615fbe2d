//! Storage boundary: contexts, factories and criteria translation.
//!
//! # Responsibility
//! - Open and configure SQLite connections as working contexts.
//! - Translate criteria trees into parameterized SQL.
//! - Own the process-wide context factory lifecycle.
//!
//! # Invariants
//! - Each context wraps exactly one private connection.
//! - No operand value is ever spliced into SQL text.

pub mod context;
pub mod factory;
mod open;
pub mod translate;

pub use context::{Context, NativeRow, SqliteContext};
pub use factory::{
    configure_global, global_factory, shutdown_global, ContextFactory, SqliteContextFactory,
};
