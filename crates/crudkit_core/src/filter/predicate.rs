//! Immutable predicate leaves and predicate groups.
//!
//! # Invariants
//! - A `Predicate` never changes after construction.
//! - `in_set`, `between` and `id_eq` always produce the arity their kind
//!   expects. `compare`/`unary` with a mismatched kind fail at translation.

use crate::model::value::Value;
use serde::{Deserialize, Serialize};

/// Nominal property carried by `IdEq`; translation uses the mapped id column.
pub const ID_PROPERTY: &str = "id";

/// Comparison performed by one predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    Eq,
    Like,
    LikeInsensitive,
    In,
    Between,
    Gt,
    Ge,
    Lt,
    Le,
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,
    IdEq,
}

impl PredicateKind {
    /// Number of operands this kind takes; `None` means any count.
    pub fn arity(self) -> Option<usize> {
        match self {
            Self::In => None,
            Self::Between => Some(2),
            Self::IsNull | Self::IsNotNull | Self::IsEmpty | Self::IsNotEmpty => Some(0),
            Self::Eq
            | Self::Like
            | Self::LikeInsensitive
            | Self::Gt
            | Self::Ge
            | Self::Lt
            | Self::Le
            | Self::IdEq => Some(1),
        }
    }
}

/// One comparison bound to a property name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    kind: PredicateKind,
    property: String,
    operands: Vec<Value>,
}

impl Predicate {
    fn new(kind: PredicateKind, property: impl Into<String>, operands: Vec<Value>) -> Self {
        Self {
            kind,
            property: property.into(),
            operands,
        }
    }

    /// Builds a single-operand comparison (`Eq`, `Like`, `Gt`, ...).
    ///
    /// Unary and set kinds passed here are still accepted; translation
    /// rejects the arity mismatch.
    pub fn compare(kind: PredicateKind, property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(kind, property, vec![value.into()])
    }

    pub fn unary(kind: PredicateKind, property: impl Into<String>) -> Self {
        Self::new(kind, property, Vec::new())
    }

    pub fn in_set<I, V>(property: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(
            PredicateKind::In,
            property,
            values.into_iter().map(Into::into).collect(),
        )
    }

    pub fn between(property: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::new(PredicateKind::Between, property, vec![low.into(), high.into()])
    }

    pub fn id_eq(value: impl Into<Value>) -> Self {
        Self::new(PredicateKind::IdEq, ID_PROPERTY, vec![value.into()])
    }

    pub fn kind(&self) -> PredicateKind {
        self.kind
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn operands(&self) -> &[Value] {
        &self.operands
    }
}

/// How members of a group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Junction {
    Conjunction,
    Disjunction,
}

/// Node of a predicate tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Predicate(Predicate),
    Group {
        junction: Junction,
        members: Vec<Criterion>,
    },
}

impl From<Predicate> for Criterion {
    fn from(value: Predicate) -> Self {
        Self::Predicate(value)
    }
}
