//! Generic repository over any `Entity`.
//!
//! # Responsibility
//! - Provide CRUD, filtered listing and a native-SQL escape hatch for any
//!   mapped entity type without per-entity code.
//! - Run every call inside exactly one unit of work.
//!
//! # Invariants
//! - `save`/`update` return the row as re-read from the store, never the input.
//! - Single-row lookups fail with `NotFound` on zero rows and
//!   `InvariantViolation` on more than one.
//! - An unconstrained filter behaves exactly like `find_all`.

use crate::db::context::{Context, NativeRow};
use crate::db::factory::{ContextFactory, SqliteContextFactory};
use crate::error::{DataError, DataResult};
use crate::filter::{Criterion, Filter, Predicate};
use crate::model::entity::{Entity, EntityMapping};
use crate::model::value::Value;
use crate::repo::unit_of_work::UnitOfWork;
use log::error;
use std::marker::PhantomData;
use std::sync::Arc;

/// Expected cardinality of a native query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    List,
    Single,
}

/// Result of a native query, shaped by the requested `ResultShape`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeResult {
    List(Vec<NativeRow>),
    Single(NativeRow),
}

impl NativeResult {
    pub fn into_rows(self) -> Vec<NativeRow> {
        match self {
            Self::List(rows) => rows,
            Self::Single(row) => vec![row],
        }
    }
}

/// Caller-facing CRUD contract for one entity type.
pub trait Repository<E: Entity> {
    fn find_all(&self) -> DataResult<Vec<E>>;
    fn find_all_by(&self, filter: &Filter) -> DataResult<Vec<E>>;
    fn find(&self, id: E::Id) -> DataResult<E>;
    fn save(&self, entity: &E) -> DataResult<E>;
    fn update(&self, entity: &E) -> DataResult<E>;
    fn delete(&self, entity: &E) -> DataResult<()>;
    fn native_query(
        &self,
        sql: &str,
        shape: ResultShape,
        params: &[Value],
    ) -> DataResult<NativeResult>;
    fn native_execute(&self, sql: &str, params: &[Value]) -> DataResult<usize>;
}

/// Repository for `E` backed by contexts from `F`.
///
/// Cheap to clone; clones share the factory.
pub struct GenericRepository<E, F = SqliteContextFactory> {
    factory: Arc<F>,
    mapping: EntityMapping,
    _entity: PhantomData<fn() -> E>,
}

impl<E, F> Clone for GenericRepository<E, F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            mapping: self.mapping.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E, F> GenericRepository<E, F>
where
    E: Entity,
    F: ContextFactory,
{
    pub fn new(factory: Arc<F>, mapping: EntityMapping) -> Self {
        Self {
            factory,
            mapping,
            _entity: PhantomData,
        }
    }

    pub fn mapping(&self) -> &EntityMapping {
        &self.mapping
    }

    fn run<T>(
        &self,
        operation: &'static str,
        action: impl FnOnce(&mut F::Context) -> DataResult<T>,
    ) -> DataResult<T> {
        UnitOfWork::<F::Context>::run(self.factory.as_ref(), operation, action)
    }

    fn load_one(&self, context: &mut F::Context, id: Value) -> DataResult<E> {
        let by_id = [Criterion::from(Predicate::id_eq(id.clone()))];
        let mut rows = context.query::<E>(&self.mapping, &by_id)?;
        match rows.len() {
            0 => Err(DataError::not_found(self.mapping.table(), id)),
            1 => rows
                .pop()
                .ok_or_else(|| DataError::not_found(self.mapping.table(), id)),
            count => Err(self.ambiguous(format!("id {id}"), count)),
        }
    }

    fn required_id(&self, entity: &E) -> DataResult<Value> {
        entity
            .id()
            .map(Into::into)
            .ok_or_else(|| DataError::MissingIdentifier {
                entity: self.mapping.table().to_string(),
            })
    }

    fn ambiguous(&self, what: String, count: usize) -> DataError {
        error!(
            "event=invariant_violation module=repo status=error table={} lookup={what} rows={count}",
            self.mapping.table()
        );
        DataError::InvariantViolation(format!(
            "{} lookup by {what} matched {count} rows, expected one",
            self.mapping.table()
        ))
    }
}

impl<E, F> Repository<E> for GenericRepository<E, F>
where
    E: Entity,
    F: ContextFactory,
{
    fn find_all(&self) -> DataResult<Vec<E>> {
        self.run("find_all", |context| {
            Ok(context.query::<E>(&self.mapping, &[])?)
        })
    }

    fn find_all_by(&self, filter: &Filter) -> DataResult<Vec<E>> {
        self.run("find_all_by", |context| {
            Ok(context.query::<E>(&self.mapping, filter.criteria())?)
        })
    }

    fn find(&self, id: E::Id) -> DataResult<E> {
        let id: Value = id.into();
        self.run("find", |context| self.load_one(context, id))
    }

    /// Inserts `entity`, then re-reads it by its generated id in the same
    /// unit of work so defaults and trigger output are visible.
    fn save(&self, entity: &E) -> DataResult<E> {
        self.run("save", |context| {
            let id = context.insert(&self.mapping, entity)?;
            self.load_one(context, id)
        })
    }

    fn update(&self, entity: &E) -> DataResult<E> {
        let id = self.required_id(entity)?;
        self.run("update", |context| {
            context
                .merge(&self.mapping, &id, entity)?
                .ok_or_else(|| DataError::not_found(self.mapping.table(), &id))
        })
    }

    fn delete(&self, entity: &E) -> DataResult<()> {
        let id = self.required_id(entity)?;
        self.run("delete", |context| match context.remove(&self.mapping, &id)? {
            0 => Err(DataError::not_found(self.mapping.table(), &id)),
            1 => Ok(()),
            count => Err(self.ambiguous(format!("id {id}"), count)),
        })
    }

    /// Runs store-native SQL with positional parameters (`?` or `?N`).
    ///
    /// `Single` fails with `NotFound` on zero rows and `InvariantViolation`
    /// on more than one.
    fn native_query(
        &self,
        sql: &str,
        shape: ResultShape,
        params: &[Value],
    ) -> DataResult<NativeResult> {
        self.run("native_query", |context| {
            let mut rows = context.execute_native(sql, params)?;
            match shape {
                ResultShape::List => Ok(NativeResult::List(rows)),
                ResultShape::Single => match rows.len() {
                    0 => Err(DataError::not_found("native query", sql)),
                    1 => rows
                        .pop()
                        .map(NativeResult::Single)
                        .ok_or_else(|| DataError::not_found("native query", sql)),
                    count => Err(self.ambiguous(format!("native query `{sql}`"), count)),
                },
            }
        })
    }

    /// Runs store-native SQL that returns no rows, returning the change count.
    fn native_execute(&self, sql: &str, params: &[Value]) -> DataResult<usize> {
        self.run("native_execute", |context| {
            Ok(context.execute_native_update(sql, params)?)
        })
    }
}
