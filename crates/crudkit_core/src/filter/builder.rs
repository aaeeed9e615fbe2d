//! Fluent filter builder.
//!
//! Every call mutates the receiver and returns it for chaining. Nothing is
//! copied on write: a filter reused after further mutation carries the extra
//! criteria too.

use crate::filter::predicate::{Criterion, Junction, Predicate, PredicateKind};
use crate::model::value::Value;
use serde::{Deserialize, Serialize};

/// Append-only set of predicates and predicate groups.
///
/// Top-level criteria are combined with AND. Adding a criterion equal to one
/// already present is a no-op. No property validation happens here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    criteria: Vec<Criterion>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(&mut self, property: &str, value: impl Into<Value>) -> &mut Self {
        self.compare(PredicateKind::Eq, property, value)
    }

    /// Pattern match; wildcard syntax is the store's (`%`, `_` for SQLite).
    pub fn like(&mut self, property: &str, pattern: impl Into<Value>) -> &mut Self {
        self.compare(PredicateKind::Like, property, pattern)
    }

    pub fn like_insensitive(&mut self, property: &str, pattern: impl Into<Value>) -> &mut Self {
        self.compare(PredicateKind::LikeInsensitive, property, pattern)
    }

    /// Set membership. An empty `values` matches nothing.
    pub fn is_in<I, V>(&mut self, property: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add(Predicate::in_set(property, values))
    }

    /// Inclusive range. `low <= high` is not checked.
    pub fn between(
        &mut self,
        property: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.add(Predicate::between(property, low, high))
    }

    pub fn greater_than(&mut self, property: &str, value: impl Into<Value>) -> &mut Self {
        self.compare(PredicateKind::Gt, property, value)
    }

    pub fn greater_than_or_equal(&mut self, property: &str, value: impl Into<Value>) -> &mut Self {
        self.compare(PredicateKind::Ge, property, value)
    }

    pub fn less_than(&mut self, property: &str, value: impl Into<Value>) -> &mut Self {
        self.compare(PredicateKind::Lt, property, value)
    }

    pub fn less_than_or_equal(&mut self, property: &str, value: impl Into<Value>) -> &mut Self {
        self.compare(PredicateKind::Le, property, value)
    }

    pub fn id_equal(&mut self, value: impl Into<Value>) -> &mut Self {
        self.add(Predicate::id_eq(value))
    }

    pub fn is_null(&mut self, property: &str) -> &mut Self {
        self.add(Predicate::unary(PredicateKind::IsNull, property))
    }

    pub fn is_not_null(&mut self, property: &str) -> &mut Self {
        self.add(Predicate::unary(PredicateKind::IsNotNull, property))
    }

    pub fn is_empty(&mut self, property: &str) -> &mut Self {
        self.add(Predicate::unary(PredicateKind::IsEmpty, property))
    }

    pub fn is_not_empty(&mut self, property: &str) -> &mut Self {
        self.add(Predicate::unary(PredicateKind::IsNotEmpty, property))
    }

    /// Embeds `other`'s current criteria as one AND-group.
    pub fn conjunction(&mut self, other: &Filter) -> &mut Self {
        self.group(Junction::Conjunction, other)
    }

    /// Embeds `other`'s current criteria as one OR-group.
    pub fn disjunction(&mut self, other: &Filter) -> &mut Self {
        self.group(Junction::Disjunction, other)
    }

    /// Appends a prebuilt criterion, keeping set semantics.
    pub fn add(&mut self, criterion: impl Into<Criterion>) -> &mut Self {
        let criterion = criterion.into();
        if !self.criteria.contains(&criterion) {
            self.criteria.push(criterion);
        }
        self
    }

    /// Accumulated criteria, in first-insertion order.
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn into_criteria(self) -> Vec<Criterion> {
        self.criteria
    }

    /// Returns whether no criterion was added; such a filter matches all rows.
    pub fn is_unconstrained(&self) -> bool {
        self.criteria.is_empty()
    }

    fn compare(&mut self, kind: PredicateKind, property: &str, value: impl Into<Value>) -> &mut Self {
        self.add(Predicate::compare(kind, property, value))
    }

    fn group(&mut self, junction: Junction, other: &Filter) -> &mut Self {
        self.add(Criterion::Group {
            junction,
            members: other.criteria.clone(),
        })
    }
}
