//! Entity contract and table mapping descriptor.
//!
//! # Responsibility
//! - Let callers plug any record type into the generic repository.
//! - Resolve filter property names to mapped columns at translation time.
//!
//! # Invariants
//! - The repository reads an entity's fields only through `Entity`.
//! - Unmapped properties resolve to a column of the same name.

use crate::model::value::Value;
use rusqlite::Row;
use std::collections::BTreeMap;

const DEFAULT_ID_COLUMN: &str = "id";

/// Record type persisted by the store and identified by one primary key.
pub trait Entity: Sized {
    type Id: Into<Value>;

    /// Primary key, or `None` when the store is expected to generate it.
    fn id(&self) -> Option<Self::Id>;

    /// Persisted non-key columns as `(column, value)` pairs.
    fn columns(&self) -> Vec<(&'static str, Value)>;

    /// Decodes one row selected from the mapped table.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Child table backing a collection property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionMapping {
    pub table: String,
    /// Column in `table` referencing the owner's id column.
    pub foreign_key: String,
}

/// Mapping metadata supplied when a repository is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMapping {
    table: String,
    id_column: String,
    columns: BTreeMap<String, String>,
    collections: BTreeMap<String, CollectionMapping>,
}

impl EntityMapping {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            id_column: DEFAULT_ID_COLUMN.to_string(),
            columns: BTreeMap::new(),
            collections: BTreeMap::new(),
        }
    }

    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    /// Maps a filter property onto a differently named column.
    pub fn property(mut self, property: impl Into<String>, column: impl Into<String>) -> Self {
        self.columns.insert(property.into(), column.into());
        self
    }

    /// Declares `property` as a one-to-many collection stored in `table`.
    pub fn collection(
        mut self,
        property: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.collections.insert(
            property.into(),
            CollectionMapping {
                table: table.into(),
                foreign_key: foreign_key.into(),
            },
        );
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id(&self) -> &str {
        &self.id_column
    }

    pub fn column_for<'a>(&'a self, property: &'a str) -> &'a str {
        self.columns
            .get(property)
            .map_or(property, String::as_str)
    }

    pub fn collection_for(&self, property: &str) -> Option<&CollectionMapping> {
        self.collections.get(property)
    }
}
