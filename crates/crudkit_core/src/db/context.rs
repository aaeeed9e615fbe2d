//! Working context contract and SQLite implementation.
//!
//! # Responsibility
//! - Expose the narrow set of store operations the unit of work drives.
//! - Keep SQL text generation and row decoding inside the store boundary.
//!
//! # Invariants
//! - A context is owned by exactly one unit of work at a time.
//! - `release` consumes the context; a released context cannot be reused.

use crate::config::BeginMode;
use crate::db::translate::{quote_ident, select_statement};
use crate::error::{StoreError, StoreResult};
use crate::filter::{Criterion, Predicate};
use crate::model::entity::{Entity, EntityMapping};
use crate::model::value::Value;
use log::{debug, warn};
use rusqlite::{params_from_iter, Connection};

/// One row returned by a native query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeRow {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl NativeRow {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn by_name(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|name| name == column)
            .and_then(|index| self.values.get(index))
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Handle to one logical session with the store.
pub trait Context {
    fn begin(&mut self) -> StoreResult<()>;
    fn commit(&mut self) -> StoreResult<()>;
    fn rollback(&mut self) -> StoreResult<()>;
    /// Returns whether a transaction is open on this context.
    fn in_transaction(&self) -> bool;

    fn query<E: Entity>(
        &mut self,
        mapping: &EntityMapping,
        criteria: &[Criterion],
    ) -> StoreResult<Vec<E>>;
    /// Inserts `entity` and returns its (possibly generated) id.
    fn insert<E: Entity>(&mut self, mapping: &EntityMapping, entity: &E) -> StoreResult<Value>;
    /// Writes `entity`'s state over the row with id `id` and returns the
    /// reloaded row, or `None` when no such row exists.
    fn merge<E: Entity>(
        &mut self,
        mapping: &EntityMapping,
        id: &Value,
        entity: &E,
    ) -> StoreResult<Option<E>>;
    /// Deletes the row with id `id`, returning the number of rows removed.
    fn remove(&mut self, mapping: &EntityMapping, id: &Value) -> StoreResult<usize>;

    fn execute_native(&mut self, sql: &str, params: &[Value]) -> StoreResult<Vec<NativeRow>>;
    fn execute_native_update(&mut self, sql: &str, params: &[Value]) -> StoreResult<usize>;

    /// Closes the context.
    fn release(self);
}

/// Context backed by one private SQLite connection.
pub struct SqliteContext {
    conn: Connection,
    begin_mode: BeginMode,
}

impl SqliteContext {
    pub(crate) fn new(conn: Connection, begin_mode: BeginMode) -> Self {
        Self { conn, begin_mode }
    }
}

impl Context for SqliteContext {
    fn begin(&mut self) -> StoreResult<()> {
        self.conn.execute_batch(self.begin_mode.begin_sql())?;
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        self.conn.execute_batch("ROLLBACK;")?;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn query<E: Entity>(
        &mut self,
        mapping: &EntityMapping,
        criteria: &[Criterion],
    ) -> StoreResult<Vec<E>> {
        let statement = select_statement(mapping, criteria)?;
        debug!(
            "event=context_query module=db status=start table={} params={}",
            mapping.table(),
            statement.params.len()
        );

        let mut stmt = self.conn.prepare(&statement.sql)?;
        let mut rows = stmt.query(params_from_iter(statement.params.iter()))?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(E::from_row(row)?);
        }
        Ok(entities)
    }

    fn insert<E: Entity>(&mut self, mapping: &EntityMapping, entity: &E) -> StoreResult<Value> {
        let mut columns = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(id) = entity.id() {
            columns.push(quote_ident(mapping.id()));
            values.push(id.into());
        }
        for (column, value) in entity.columns() {
            columns.push(quote_ident(column));
            values.push(value);
        }

        let table = quote_ident(mapping.table());
        let returning = quote_ident(mapping.id());
        let sql = if columns.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES RETURNING {returning}")
        } else {
            let placeholders = vec!["?"; columns.len()].join(", ");
            format!(
                "INSERT INTO {table} ({}) VALUES ({placeholders}) RETURNING {returning}",
                columns.join(", ")
            )
        };

        let id = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get::<_, Value>(0))?;
        Ok(id)
    }

    fn merge<E: Entity>(
        &mut self,
        mapping: &EntityMapping,
        id: &Value,
        entity: &E,
    ) -> StoreResult<Option<E>> {
        let table = quote_ident(mapping.table());
        let id_column = quote_ident(mapping.id());
        let assignments = entity.columns();

        let changed = if assignments.is_empty() {
            let exists: i64 = self.conn.query_row(
                &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE {id_column} = ?)"),
                [id],
                |row| row.get(0),
            )?;
            usize::try_from(exists).unwrap_or(0)
        } else {
            let set_clause = assignments
                .iter()
                .map(|(column, _)| format!("{} = ?", quote_ident(column)))
                .collect::<Vec<_>>()
                .join(", ");
            let mut values = assignments
                .into_iter()
                .map(|(_, value)| value)
                .collect::<Vec<_>>();
            values.push(id.clone());
            self.conn.execute(
                &format!("UPDATE {table} SET {set_clause} WHERE {id_column} = ?"),
                params_from_iter(values.iter()),
            )?
        };

        if changed == 0 {
            return Ok(None);
        }

        let by_id = [Criterion::from(Predicate::id_eq(id.clone()))];
        let mut reloaded = self.query::<E>(mapping, &by_id)?;
        match reloaded.len() {
            1 => Ok(reloaded.pop()),
            count => Err(StoreError::InvalidData(format!(
                "merge of {} id {id} reloaded {count} rows",
                mapping.table()
            ))),
        }
    }

    fn remove(&mut self, mapping: &EntityMapping, id: &Value) -> StoreResult<usize> {
        let removed = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?",
                quote_ident(mapping.table()),
                quote_ident(mapping.id())
            ),
            [id],
        )?;
        Ok(removed)
    }

    fn execute_native(&mut self, sql: &str, params: &[Value]) -> StoreResult<Vec<NativeRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..columns.len())
                .map(|index| row.get::<_, Value>(index))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            result.push(NativeRow::new(columns.clone(), values));
        }
        Ok(result)
    }

    fn execute_native_update(&mut self, sql: &str, params: &[Value]) -> StoreResult<usize> {
        let changed = self.conn.execute(sql, params_from_iter(params.iter()))?;
        Ok(changed)
    }

    fn release(self) {
        if let Err((_conn, err)) = self.conn.close() {
            warn!("event=context_release module=db status=error error={err}");
        }
    }
}
