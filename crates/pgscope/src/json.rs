//! JSON projection: have PostgreSQL render rows as JSON.
//!
//! [`JsonSelect`] wraps a relation in `row_to_json` / `array_to_json` and
//! nests associations as correlated subqueries, so a whole object graph comes
//! back as one JSON value from one statement.

use pgscope_core::{Dialect, PostgresDialect, SqlValue};
use tracing::debug;

use crate::association::{build_association_scope, AssociationDescriptor, AssociationKind, Outside};
use crate::error::Result;
use crate::relation::Relation;

/// A JSON projection of a relation.
///
/// # Example
///
/// ```
/// use pgscope::{AssociationDescriptor, JsonSelect, ModelMeta, Relation};
///
/// let users = ModelMeta::new("users").primary_key("id");
/// let posts = AssociationDescriptor::has_many("posts", ModelMeta::new("posts").primary_key("id"))
///     .foreign_key("author_id");
///
/// let (sql, _) = JsonSelect::new(Relation::new(users))
///     .columns(&["id", "name"])
///     .include(posts)
///     .to_array_sql()
///     .unwrap();
/// assert!(sql.starts_with("SELECT array_to_json(coalesce(array_agg(row_to_json(t)), '{}')) FROM (SELECT "));
/// assert!(sql.contains(r#"WHERE "users"."id" = "posts"."author_id") t) AS "posts""#));
/// ```
#[derive(Debug, Clone)]
pub struct JsonSelect {
    relation: Relation,
    columns: Option<Vec<String>>,
    includes: Vec<AssociationDescriptor>,
}

impl JsonSelect {
    /// Projects every column of `relation`.
    pub fn new(relation: Relation) -> Self {
        Self {
            relation,
            columns: None,
            includes: Vec::new(),
        }
    }

    /// Restricts the projected columns.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| (*c).to_string()).collect());
        self
    }

    /// Nests `association` under a key named after it.
    ///
    /// Has-many and has-and-belongs-to-many nest as arrays (empty when there
    /// are no rows); belongs-to nests as a single object or `null`.
    #[must_use]
    pub fn include(mut self, association: AssociationDescriptor) -> Self {
        self.includes.push(association);
        self
    }

    /// Renders a statement returning all rows as one JSON array.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an included association is
    /// incomplete.
    pub fn to_array_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        let (inner, params) = self.projected()?.build_select();
        Ok(finish(array_json(&inner), params))
    }

    /// Renders a statement returning the first row as one JSON object.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an included association is
    /// incomplete.
    pub fn to_row_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        let (inner, params) = self.projected()?.limit(1).build_select();
        Ok(finish(row_json(&inner), params))
    }

    fn projected(&self) -> Result<Relation> {
        let dialect = PostgresDialect::new();
        let mut relation = self.relation.clone();
        if let Some(columns) = &self.columns {
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            relation = relation.only(&columns);
        }

        let owner = self.relation.model();
        for association in &self.includes {
            let scope = build_association_scope(association, Outside::table(owner))?;
            let (sql, params) = match association.kind {
                AssociationKind::BelongsTo => {
                    let (sub, params) = scope.limit(1).build_select();
                    (row_json(&sub), params)
                }
                AssociationKind::HasMany | AssociationKind::HasAndBelongsToMany => {
                    let (sub, params) = scope.build_select();
                    (array_json(&sub), params)
                }
            };
            let alias = dialect.quote_identifier(&association.name);
            relation = relation.select_raw(&format!("({sql}) AS {alias}"), params);
        }
        Ok(relation)
    }
}

fn array_json(select: &str) -> String {
    format!("SELECT array_to_json(coalesce(array_agg(row_to_json(t)), '{{}}')) FROM ({select}) t")
}

fn row_json(select: &str) -> String {
    format!("SELECT row_to_json(t) FROM ({select}) t")
}

fn finish(sql: String, params: Vec<SqlValue>) -> (String, Vec<SqlValue>) {
    debug!(sql = %sql, "Built JSON projection");
    (PostgresDialect::new().number_placeholders(&sql), params)
}
