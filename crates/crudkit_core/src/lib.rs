//! Generic data-access layer over SQLite.
//! Uniform CRUD, composable filters and unit-of-work execution for any
//! mapped entity type.

pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{BeginMode, JournalMode, StoreConfig, StoreLocation};
pub use db::{
    configure_global, global_factory, shutdown_global, Context, ContextFactory, NativeRow,
    SqliteContext, SqliteContextFactory,
};
pub use error::{DataError, DataResult, StoreError, StoreResult};
pub use filter::{Criterion, Filter, Junction, Predicate, PredicateKind};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::entity::{CollectionMapping, Entity, EntityMapping};
pub use model::value::Value;
pub use repo::generic_repo::{GenericRepository, NativeResult, Repository, ResultShape};
pub use repo::unit_of_work::{UnitOfWork, UnitOfWorkState};

/// Returns the crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
