//! Criteria tree to parameterized SQLite text.
//!
//! # Invariants
//! - Operands are only ever bound as `?` parameters, in textual order.
//! - Identifiers are always double-quoted.
//! - `In` with no operands renders an always-false condition.
//! - An empty group renders an always-true condition.

use crate::error::{StoreError, StoreResult};
use crate::filter::{Criterion, Junction, Predicate, PredicateKind};
use crate::model::entity::EntityMapping;
use crate::model::value::Value;

const ALWAYS_TRUE: &str = "1 = 1";
const ALWAYS_FALSE: &str = "0 = 1";

/// SQL text plus the parameters its placeholders bind, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Quotes one identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Builds `SELECT * FROM table [WHERE ...]` for the given top-level criteria.
pub fn select_statement(mapping: &EntityMapping, criteria: &[Criterion]) -> StoreResult<SqlFragment> {
    let mut fragment = SqlFragment {
        sql: format!("SELECT * FROM {}", quote_ident(mapping.table())),
        params: Vec::new(),
    };
    if let Some(condition) = where_condition(mapping, criteria)? {
        fragment.sql.push_str(" WHERE ");
        fragment.sql.push_str(&condition.sql);
        fragment.params = condition.params;
    }
    Ok(fragment)
}

/// Renders the AND of `criteria`, or `None` when there is nothing to constrain.
pub fn where_condition(
    mapping: &EntityMapping,
    criteria: &[Criterion],
) -> StoreResult<Option<SqlFragment>> {
    if criteria.is_empty() {
        return Ok(None);
    }

    let mut params = Vec::new();
    let sql = render_junction(mapping, Junction::Conjunction, criteria, &mut params)?;
    Ok(Some(SqlFragment { sql, params }))
}

fn render_junction(
    mapping: &EntityMapping,
    junction: Junction,
    members: &[Criterion],
    params: &mut Vec<Value>,
) -> StoreResult<String> {
    if members.is_empty() {
        return Ok(ALWAYS_TRUE.to_string());
    }

    let separator = match junction {
        Junction::Conjunction => " AND ",
        Junction::Disjunction => " OR ",
    };
    let parts = members
        .iter()
        .map(|member| render_criterion(mapping, member, params))
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(parts.join(separator))
}

fn render_criterion(
    mapping: &EntityMapping,
    criterion: &Criterion,
    params: &mut Vec<Value>,
) -> StoreResult<String> {
    match criterion {
        Criterion::Predicate(predicate) => render_predicate(mapping, predicate, params),
        Criterion::Group { junction, members } => Ok(format!(
            "({})",
            render_junction(mapping, *junction, members, params)?
        )),
    }
}

fn render_predicate(
    mapping: &EntityMapping,
    predicate: &Predicate,
    params: &mut Vec<Value>,
) -> StoreResult<String> {
    check_arity(predicate)?;

    let kind = predicate.kind();
    let operands = predicate.operands();
    let column = match kind {
        PredicateKind::IdEq => quote_ident(mapping.id()),
        _ => quote_ident(mapping.column_for(predicate.property())),
    };

    let sql = match kind {
        PredicateKind::Eq | PredicateKind::IdEq => binary(&column, "=", operands, params),
        PredicateKind::Gt => binary(&column, ">", operands, params),
        PredicateKind::Ge => binary(&column, ">=", operands, params),
        PredicateKind::Lt => binary(&column, "<", operands, params),
        PredicateKind::Le => binary(&column, "<=", operands, params),
        PredicateKind::Like => binary(&column, "LIKE", operands, params),
        PredicateKind::LikeInsensitive => {
            params.extend_from_slice(operands);
            format!("LOWER({column}) LIKE LOWER(?)")
        }
        PredicateKind::Between => {
            params.extend_from_slice(operands);
            format!("{column} BETWEEN ? AND ?")
        }
        PredicateKind::In => {
            if operands.is_empty() {
                ALWAYS_FALSE.to_string()
            } else {
                params.extend_from_slice(operands);
                let placeholders = vec!["?"; operands.len()].join(", ");
                format!("{column} IN ({placeholders})")
            }
        }
        PredicateKind::IsNull => format!("{column} IS NULL"),
        PredicateKind::IsNotNull => format!("{column} IS NOT NULL"),
        PredicateKind::IsEmpty => emptiness(mapping, predicate.property(), &column, true),
        PredicateKind::IsNotEmpty => emptiness(mapping, predicate.property(), &column, false),
    };
    Ok(sql)
}

fn binary(column: &str, operator: &str, operands: &[Value], params: &mut Vec<Value>) -> String {
    params.extend_from_slice(operands);
    format!("{column} {operator} ?")
}

fn emptiness(mapping: &EntityMapping, property: &str, column: &str, empty: bool) -> String {
    match mapping.collection_for(property) {
        Some(collection) => {
            let child = quote_ident(&collection.table);
            let exists = format!(
                "EXISTS (SELECT 1 FROM {child} WHERE {child}.{} = {}.{})",
                quote_ident(&collection.foreign_key),
                quote_ident(mapping.table()),
                quote_ident(mapping.id()),
            );
            if empty {
                format!("NOT {exists}")
            } else {
                exists
            }
        }
        None if empty => format!("({column} IS NULL OR {column} = '')"),
        None => format!("({column} IS NOT NULL AND {column} <> '')"),
    }
}

fn check_arity(predicate: &Predicate) -> StoreResult<()> {
    let actual = predicate.operands().len();
    match predicate.kind().arity() {
        Some(expected) if expected != actual => Err(StoreError::InvalidPredicate(format!(
            "{:?} on `{}` expects {expected} operand(s), got {actual}",
            predicate.kind(),
            predicate.property()
        ))),
        _ => Ok(()),
    }
}
