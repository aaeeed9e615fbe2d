//! Unit-of-work lifecycle around one working context.
//!
//! # Responsibility
//! - Acquire a context, begin, run one action, then commit or roll back.
//! - Translate store failures into `DataError` exactly once.
//!
//! # Invariants
//! - The transaction is committed or rolled back before the context is released.
//! - The context is released on every exit path, panics included.
//! - A rollback failure is logged and never replaces the original error.
//! - Nothing is retried, rollback included.

use crate::db::context::Context;
use crate::db::factory::ContextFactory;
use crate::error::{DataError, DataResult};
use log::{debug, error, info, warn};
use std::time::Instant;

/// Lifecycle position of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOfWorkState {
    /// Context acquired, no transaction yet.
    Acquired,
    /// Transaction open.
    Active,
    Committed,
    RolledBack,
}

/// Exclusive, short-lived owner of one context and its transaction.
pub struct UnitOfWork<C: Context> {
    context: Option<C>,
    operation: &'static str,
    state: UnitOfWorkState,
    started_at: Instant,
}

impl<C: Context> UnitOfWork<C> {
    /// Runs `action` inside a fresh unit of work.
    ///
    /// Commits when `action` succeeds. Rolls back and returns the action's
    /// error otherwise. Store failures from begin/commit surface as
    /// `DataError::Transaction`; acquisition failures as `Connectivity`.
    pub fn run<F, T>(
        factory: &F,
        operation: &'static str,
        action: impl FnOnce(&mut C) -> DataResult<T>,
    ) -> DataResult<T>
    where
        F: ContextFactory<Context = C>,
    {
        let mut uow = Self::begin(factory, operation)?;
        let outcome = action(uow.context()?);
        match outcome {
            Ok(value) => {
                uow.commit()?;
                Ok(value)
            }
            Err(err) => {
                uow.rollback(&err);
                Err(err)
            }
        }
    }

    /// Acquires a context and opens a transaction on it.
    pub fn begin<F>(factory: &F, operation: &'static str) -> DataResult<Self>
    where
        F: ContextFactory<Context = C>,
    {
        let started_at = Instant::now();
        let context = factory.acquire().map_err(|err| {
            error!(
                "event=uow_begin module=uow status=error operation={operation} stage=acquire error={err}"
            );
            DataError::Connectivity(err)
        })?;

        let mut uow = Self {
            context: Some(context),
            operation,
            state: UnitOfWorkState::Acquired,
            started_at,
        };
        if let Err(err) = uow.context()?.begin() {
            error!(
                "event=uow_begin module=uow status=error operation={operation} stage=begin error={err}"
            );
            return Err(DataError::Transaction(err));
        }

        uow.state = UnitOfWorkState::Active;
        debug!("event=uow_begin module=uow status=ok operation={operation}");
        Ok(uow)
    }

    pub fn state(&self) -> UnitOfWorkState {
        self.state
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Context owned by this unit of work.
    pub fn context(&mut self) -> DataResult<&mut C> {
        self.context.as_mut().ok_or_else(|| {
            DataError::InvariantViolation(format!(
                "unit of work `{}` used after release",
                self.operation
            ))
        })
    }

    /// Commits and releases. A failed commit is rolled back before returning.
    pub fn commit(mut self) -> DataResult<()> {
        let committed = self.context()?.commit();
        match committed {
            Ok(()) => {
                self.state = UnitOfWorkState::Committed;
                debug!(
                    "event=uow_commit module=uow status=ok operation={} duration_ms={}",
                    self.operation,
                    self.started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                let err = DataError::Transaction(err);
                self.rollback(&err);
                Err(err)
            }
        }
    }

    /// Rolls back after `cause`, logging rollback failures instead of
    /// returning them.
    pub fn rollback(&mut self, cause: &DataError) {
        let operation = self.operation;
        let duration_ms = self.started_at.elapsed().as_millis();
        if let Some(context) = self.context.as_mut() {
            if context.in_transaction() {
                match context.rollback() {
                    Ok(()) => info!(
                        "event=uow_rollback module=uow status=ok operation={operation} duration_ms={duration_ms} cause={cause}"
                    ),
                    Err(err) => error!(
                        "event=uow_rollback module=uow status=error operation={operation} duration_ms={duration_ms} cause={cause} error={err}"
                    ),
                }
            } else {
                debug!(
                    "event=uow_rollback module=uow status=skipped operation={operation} reason=no_open_transaction cause={cause}"
                );
            }
        }
        self.state = UnitOfWorkState::RolledBack;
    }
}

impl<C: Context> Drop for UnitOfWork<C> {
    fn drop(&mut self) {
        let Some(mut context) = self.context.take() else {
            return;
        };

        if self.state == UnitOfWorkState::Active && context.in_transaction() {
            warn!(
                "event=uow_rollback module=uow status=start operation={} reason=abandoned",
                self.operation
            );
            if let Err(err) = context.rollback() {
                error!(
                    "event=uow_rollback module=uow status=error operation={} reason=abandoned error={err}",
                    self.operation
                );
            }
            self.state = UnitOfWorkState::RolledBack;
        }

        context.release();
        debug!(
            "event=context_release module=uow status=ok operation={} state={:?}",
            self.operation, self.state
        );
    }
}
