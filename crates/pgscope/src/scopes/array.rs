//! Array containment and overlap scopes.
//!
//! PostgreSQL's `@>` and `&&` need both operands to share an element type.
//! Caller values arrive untyped, so every predicate casts the literal array
//! to the column's declared element type (`ARRAY[?, ?]::integer[]`).

use pgscope_core::{Dialect, ModelMeta, PostgresDialect, SqlValue, Values};
use std::fmt;
use tracing::debug;

use super::{ColumnSet, JoinType};
use crate::error::{Result, ScopeError};
use crate::relation::Relation;

/// Array comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayOp {
    /// Contains (`@>`): every element of the right side is present.
    Contains,
    /// Overlaps (`&&`): at least one element is shared.
    Overlaps,
}

impl fmt::Display for ArrayOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains => write!(f, "@>"),
            Self::Overlaps => write!(f, "&&"),
        }
    }
}

/// Renders `"table"."column" <op> ARRAY[?, ...]::<element>[]` for
/// `param_count` placeholders.
///
/// # Errors
///
/// Returns [`ScopeError::InvalidArgument`] if the model has no such column.
pub fn array_predicate(
    model: &ModelMeta,
    column: &str,
    op: ArrayOp,
    param_count: usize,
) -> Result<String> {
    let descriptor = model.find_column(column).ok_or_else(|| {
        ScopeError::InvalidArgument(format!(
            "unknown column `{column}` on `{}`",
            model.table_name
        ))
    })?;
    let placeholders = vec![SqlValue::placeholder(); param_count].join(", ");
    Ok(format!(
        "{} {op} ARRAY[{placeholders}]::{}",
        PostgresDialect::new().qualified_column(&model.table_name, &descriptor.name),
        descriptor.array_cast()
    ))
}

fn array_scope(relation: &Relation, column: &str, op: ArrayOp, values: Values) -> Result<Relation> {
    let params = values.flatten();
    let sql = array_predicate(relation.model(), column, op, params.len())?;
    debug!(
        table = %relation.model().table_name,
        column,
        sql = %sql,
        "Adding array condition"
    );
    Ok(relation.clone().where_raw(&sql, params))
}

/// Requires `column` to contain every value.
///
/// `values` may be a single scalar or a nested list; it is flattened first.
///
/// # Errors
///
/// Returns [`ScopeError::InvalidArgument`] if the model has no such column.
pub fn contains_all(relation: &Relation, column: &str, values: impl Into<Values>) -> Result<Relation> {
    array_scope(relation, column, ArrayOp::Contains, values.into())
}

/// Requires `column` to share at least one value.
///
/// # Errors
///
/// Returns [`ScopeError::InvalidArgument`] if the model has no such column.
pub fn contains_any(relation: &Relation, column: &str, values: impl Into<Values>) -> Result<Relation> {
    array_scope(relation, column, ArrayOp::Overlaps, values.into())
}

/// Requires each listed column to contain every value, combining the
/// per-column predicates with `join`.
///
/// Repeated columns are dropped. Every predicate binds its own copy of the
/// values and carries its own cast.
///
/// # Errors
///
/// Returns [`ScopeError::InvalidArgument`] if `columns` is a single column
/// rather than a list, if the list is empty, or if a column is unknown.
pub fn any_column_contains_all(
    relation: &Relation,
    columns: impl Into<ColumnSet>,
    join: JoinType,
    values: impl Into<Values>,
) -> Result<Relation> {
    let columns = match columns.into() {
        ColumnSet::List(columns) => columns,
        ColumnSet::Single(_) => {
            return Err(ScopeError::InvalidArgument(
                "use contains_all for a single column".to_string(),
            ));
        }
    };
    let columns = super::dedup_columns(columns);
    if columns.is_empty() {
        return Err(ScopeError::InvalidArgument(
            "at least one column is required".to_string(),
        ));
    }

    let values = values.into().flatten();
    let mut predicates = Vec::with_capacity(columns.len());
    let mut params = Vec::with_capacity(columns.len() * values.len());
    for column in &columns {
        predicates.push(array_predicate(
            relation.model(),
            column,
            ArrayOp::Contains,
            values.len(),
        )?);
        params.extend(values.iter().cloned());
    }

    let sql = predicates.join(&join.to_string());
    debug!(
        table = %relation.model().table_name,
        columns = columns.len(),
        join = %join.keyword(),
        sql = %sql,
        "Adding multi-column array condition"
    );
    Ok(relation.clone().where_raw(&sql, params))
}
