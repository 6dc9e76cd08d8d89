//! OR-merging the conditions of several relations.

use pgscope_core::SqlValue;
use tracing::debug;

use crate::error::{Result, ScopeError};
use crate::relation::Relation;

const TAUTOLOGY: &str = "1=1";

/// Merges the WHERE conditions of `relations` into one OR predicate on
/// `base`.
///
/// Each relation's conditions are AND-joined and parenthesized, and the
/// groups are joined with `OR`. A relation without conditions stands for
/// "every row" and contributes `(1=1)`; with no relations at all, or only
/// unconditioned ones, the predicate is the tautology `1=1`. Only the WHERE
/// conditions are taken from `relations`; their joins and ordering are
/// ignored.
///
/// # Errors
///
/// Returns [`ScopeError::InvalidArgument`] if a relation carries a
/// structured [`Q`](crate::Q) filter instead of a textual condition.
pub fn merge_with_or(base: &Relation, relations: &[Relation]) -> Result<Relation> {
    let mut groups = Vec::with_capacity(relations.len());
    let mut params: Vec<SqlValue> = Vec::new();

    for (index, relation) in relations.iter().enumerate() {
        let mut fragments = Vec::with_capacity(relation.conditions().len());
        for condition in relation.conditions() {
            let (sql, condition_params) = condition.as_sql().ok_or_else(|| {
                ScopeError::InvalidArgument(format!(
                    "relation {index} on `{}` has a structured filter; only SQL conditions can be merged",
                    relation.model().table_name
                ))
            })?;
            fragments.push(sql.to_string());
            params.extend(condition_params.iter().cloned());
        }
        groups.push(fragments);
    }

    let sql = if groups.iter().all(Vec::is_empty) {
        TAUTOLOGY.to_string()
    } else {
        groups
            .iter()
            .map(|fragments| match fragments.as_slice() {
                [] => format!("({TAUTOLOGY})"),
                [only] => format!("({only})"),
                many => format!(
                    "({})",
                    many.iter()
                        .map(|f| format!("({f})"))
                        .collect::<Vec<_>>()
                        .join(" AND ")
                ),
            })
            .collect::<Vec<_>>()
            .join(" OR ")
    };

    debug!(
        table = %base.model().table_name,
        relations = relations.len(),
        sql = %sql,
        "Merging relations with OR"
    );
    Ok(base.clone().where_raw(&sql, params))
}
