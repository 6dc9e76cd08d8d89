//! Set membership through `= ANY(VALUES ...)`.
//!
//! For large sets the planner handles `col = ANY(VALUES (1),(2),...)` as a
//! join against a values list instead of a long `IN (...)` chain.
//!
//! # Trusted input only
//!
//! The values are rendered as SQL literals, not bound parameters, because
//! the literal `VALUES` list is the point of this scope. Text is escaped by
//! doubling single quotes, but callers should only pass trusted values such
//! as internal numeric ids. Rendering a text value logs a warning.

use pgscope_core::{dedup_values, Dialect, PostgresDialect, SqlValue, Values};
use tracing::{debug, warn};

use crate::error::{Result, ScopeError};
use crate::relation::Relation;

/// Requires `column` to equal one of `values`.
///
/// Values are flattened and de-duplicated (first occurrence wins). An empty
/// list matches no rows.
///
/// # Errors
///
/// Returns [`ScopeError::InvalidArgument`] if `values` is a scalar rather
/// than a list.
pub fn member_of_set(relation: &Relation, column: &str, values: impl Into<Values>) -> Result<Relation> {
    let values = values.into();
    if !values.is_list() {
        return Err(ScopeError::InvalidArgument(format!(
            "member_of_set on `{column}` requires a list of values"
        )));
    }

    let values = dedup_values(values.flatten());
    let table = &relation.model().table_name;
    if values.is_empty() {
        debug!(table = %table, column, "Empty value set, adding contradiction");
        return Ok(relation.clone().where_raw("1=0", vec![]));
    }

    if values.iter().any(SqlValue::is_text) {
        warn!(
            table = %table,
            column,
            "Rendering text values inline in ANY(VALUES ...); only use trusted input"
        );
    }

    let tuples: Vec<String> = values
        .iter()
        .map(|value| format!("({})", value.to_sql_inline()))
        .collect();
    let sql = format!(
        "{} = ANY(VALUES {})",
        PostgresDialect::new().qualified_column(table, column),
        tuples.join(",")
    );
    debug!(table = %table, column, values = values.len(), "Adding set membership condition");
    Ok(relation.clone().where_raw(&sql, vec![]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgscope_core::ModelMeta;

    fn posts() -> Relation {
        Relation::new(ModelMeta::new("posts").primary_key("id").column("id", "bigint"))
    }

    fn rendered(relation: &Relation) -> (String, Vec<SqlValue>) {
        relation.conditions()[0].render()
    }

    #[test]
    fn test_member_of_set_renders_values_tuples() {
        let scoped = member_of_set(&posts(), "id", vec![1, 2, 3]).unwrap();
        let (sql, params) = rendered(&scoped);
        assert_eq!(sql, "\"posts\".\"id\" = ANY(VALUES (1),(2),(3))");
        assert!(params.is_empty());
    }

    #[test]
    fn test_member_of_set_dedups() {
        let with_dupes = member_of_set(&posts(), "id", vec![1, 1, 2]).unwrap();
        let without = member_of_set(&posts(), "id", vec![1, 2]).unwrap();
        assert_eq!(rendered(&with_dupes), rendered(&without));
    }

    #[test]
    fn test_member_of_set_flattens() {
        let scoped = member_of_set(&posts(), "id", vec![vec![3, 1], vec![3, 2]]).unwrap();
        assert_eq!(
            rendered(&scoped).0,
            "\"posts\".\"id\" = ANY(VALUES (3),(1),(2))"
        );
    }

    #[test]
    fn test_member_of_set_quotes_non_finite_floats() {
        let scoped = member_of_set(&posts(), "score", vec![f64::NAN, f64::INFINITY, 1.5]).unwrap();
        assert_eq!(
            rendered(&scoped).0,
            "\"posts\".\"score\" = ANY(VALUES ('NaN'::float8),('Infinity'::float8),(1.5))"
        );
    }

    #[test]
    fn test_member_of_set_rejects_scalar() {
        let err = member_of_set(&posts(), "id", 5).unwrap_err();
        assert!(matches!(err, ScopeError::InvalidArgument(_)));
    }

    #[test]
    fn test_member_of_set_empty_matches_nothing() {
        let scoped = member_of_set(&posts(), "id", Values::empty()).unwrap();
        assert_eq!(rendered(&scoped).0, "1=0");
    }

    #[test]
    fn test_member_of_set_text_is_rendered_inline_and_escaped() {
        // Literal rendering is intentional; quotes are doubled, nothing is bound.
        let scoped = member_of_set(&posts(), "id", vec!["a", "it's"]).unwrap();
        let (sql, params) = rendered(&scoped);
        assert_eq!(sql, "\"posts\".\"id\" = ANY(VALUES ('a'),('it''s'))");
        assert!(params.is_empty());
    }
}
