//! Context factories and the process-wide factory singleton.
//!
//! # Responsibility
//! - Hand out one private, freshly bootstrapped context per unit of work.
//! - Own the process-wide factory lifecycle: lazy init, shutdown, rebuild.
//!
//! # Invariants
//! - The global factory is built at most once per configure/shutdown cycle,
//!   even under concurrent first callers.
//! - A shut-down factory never hands out another context.
//! - Memory stores stay alive while their factory is open.

use crate::config::{StoreConfig, StoreLocation};
use crate::db::context::{Context, SqliteContext};
use crate::db::open::{open_connection, StoreTarget};
use crate::error::{DataError, DataResult, StoreError, StoreResult};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Source of working contexts.
pub trait ContextFactory: Send + Sync {
    type Context: Context;

    /// Opens a new context. May be called any number of times.
    fn acquire(&self) -> StoreResult<Self::Context>;
}

impl<F: ContextFactory> ContextFactory for Arc<F> {
    type Context = F::Context;

    fn acquire(&self) -> StoreResult<Self::Context> {
        (**self).acquire()
    }
}

/// Factory opening one SQLite connection per context.
pub struct SqliteContextFactory {
    config: StoreConfig,
    target: StoreTarget,
    keeper: Mutex<Option<Connection>>,
    closed: AtomicBool,
    acquired: AtomicU64,
}

impl SqliteContextFactory {
    /// Builds a factory and verifies the store is reachable.
    ///
    /// For memory stores the probe connection is kept open for the
    /// factory's lifetime so the database survives between contexts.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let memory_name = match &config.location {
            StoreLocation::Memory { name: Some(name) } => name.clone(),
            StoreLocation::Memory { name: None } => format!("crudkit-{}", Uuid::new_v4()),
            StoreLocation::File { .. } => String::new(),
        };
        let target = StoreTarget::resolve(&config, &memory_name);
        let probe = open_connection(&target, &config)?;
        let keeper = if config.is_memory() {
            Some(probe)
        } else {
            drop(probe);
            None
        };

        info!(
            "event=factory_init module=factory status=ok mode={}",
            target.mode()
        );
        Ok(Self {
            config,
            target,
            keeper: Mutex::new(keeper),
            closed: AtomicBool::new(false),
            acquired: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of contexts handed out so far.
    pub fn acquired_count(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }

    /// Stops handing out contexts and drops the memory keeper connection.
    ///
    /// Idempotent. Contexts already handed out stay usable until released.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let keeper = lock_recovering(&self.keeper).take();
        if let Some(conn) = keeper {
            if let Err((_conn, err)) = conn.close() {
                warn!("event=factory_shutdown module=factory status=error error={err}");
            }
        }
        info!(
            "event=factory_shutdown module=factory status=ok acquired={}",
            self.acquired_count()
        );
    }
}

impl ContextFactory for SqliteContextFactory {
    type Context = SqliteContext;

    fn acquire(&self) -> StoreResult<SqliteContext> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        let conn = open_connection(&self.target, &self.config)?;
        let count = self.acquired.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("event=context_acquire module=factory status=ok count={count}");
        Ok(SqliteContext::new(conn, self.config.begin_mode))
    }
}

impl Drop for SqliteContextFactory {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[derive(Default)]
struct GlobalSlot {
    config: Option<StoreConfig>,
    factory: Option<Arc<SqliteContextFactory>>,
}

static GLOBAL_FACTORY: Lazy<Mutex<GlobalSlot>> = Lazy::new(|| Mutex::new(GlobalSlot::default()));

/// Records the configuration used to build the global factory.
///
/// # Errors
/// - Returns `Configuration` when a live global factory was built from a
///   different configuration. Call `shutdown_global` first to switch.
pub fn configure_global(config: StoreConfig) -> DataResult<()> {
    let mut slot = global_slot();
    if let Some(factory) = slot.factory.as_ref() {
        if factory.config() != &config {
            return Err(DataError::Configuration(
                "global context factory already initialized with a different configuration; \
                 shut it down before reconfiguring"
                    .to_string(),
            ));
        }
        return Ok(());
    }
    slot.config = Some(config);
    Ok(())
}

/// Returns the global factory, building it on first use.
///
/// # Errors
/// - `Configuration` when `configure_global` was never called.
/// - `Connectivity` when the store cannot be reached.
pub fn global_factory() -> DataResult<Arc<SqliteContextFactory>> {
    let mut slot = global_slot();
    if let Some(factory) = slot.factory.as_ref() {
        return Ok(Arc::clone(factory));
    }

    let config = slot.config.clone().ok_or_else(|| {
        DataError::Configuration("global context factory is not configured".to_string())
    })?;
    let factory = Arc::new(SqliteContextFactory::new(config).map_err(DataError::Connectivity)?);
    slot.factory = Some(Arc::clone(&factory));
    Ok(factory)
}

/// Shuts down the global factory, if one was built.
///
/// The recorded configuration is kept, so the next `global_factory` call
/// builds a fresh factory. Returns whether a live factory was shut down.
pub fn shutdown_global() -> bool {
    let factory = global_slot().factory.take();
    match factory {
        Some(factory) => {
            factory.shutdown();
            true
        }
        None => false,
    }
}

fn global_slot() -> MutexGuard<'static, GlobalSlot> {
    GLOBAL_FACTORY.lock().unwrap_or_else(PoisonError::into_inner)
}

fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
