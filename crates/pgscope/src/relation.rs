//! Relation: a lazy, chainable representation of an unexecuted query.
//!
//! Relations never execute anything. They accumulate joins, conditions,
//! ordering and paging, and render to SQL plus bound parameters on demand.

use pgscope_core::{Dialect, ModelMeta, PostgresDialect, SqlValue};
use std::sync::Arc;

use crate::query::{FilterExpr, Q};

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

/// An ordering specification on a single column.
#[derive(Debug, Clone)]
pub struct OrderBy {
    /// Column to order by
    pub column: String,
    /// Order direction
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates a new ascending order specification.
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Asc,
        }
    }

    /// Creates a new descending order specification.
    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Desc,
        }
    }

    /// Parses a Django-style order specification.
    ///
    /// Prefix with `-` for descending order.
    /// Example: `"-created_at"` for descending, `"name"` for ascending.
    pub fn parse(spec: &str) -> Self {
        if let Some(column) = spec.strip_prefix('-') {
            Self::desc(column)
        } else {
            Self::asc(spec)
        }
    }

    /// Returns the SQL representation, qualifying the column with `table`.
    pub fn to_sql(&self, table: &str) -> String {
        let column = PostgresDialect::new().qualified_column(table, &self.column);
        match self.direction {
            OrderDirection::Asc => format!("{column} ASC"),
            OrderDirection::Desc => format!("{column} DESC"),
        }
    }
}

/// A WHERE condition accumulated on a relation.
#[derive(Debug, Clone)]
pub enum Condition {
    /// A fully resolved SQL fragment with `?` placeholders.
    Sql {
        /// The fragment.
        sql: String,
        /// Bound parameters, in placeholder order.
        params: Vec<SqlValue>,
    },
    /// A structured filter rendered only when the relation is built.
    Filter(FilterExpr),
}

impl Condition {
    /// Renders the condition.
    pub fn render(&self) -> (String, Vec<SqlValue>) {
        match self {
            Self::Sql { sql, params } => (sql.clone(), params.clone()),
            Self::Filter(expr) => expr.build(),
        }
    }

    /// Returns the textual fragment and its parameters, or `None` for a
    /// structured filter.
    pub fn as_sql(&self) -> Option<(&str, &[SqlValue])> {
        match self {
            Self::Sql { sql, params } => Some((sql.as_str(), params.as_slice())),
            Self::Filter(_) => None,
        }
    }
}

/// A lazy, chainable query on one model's table.
///
/// Chaining methods consume the relation and return the modified one;
/// scope builders take `&Relation` and return a new relation, so a relation
/// handed to a scope is never changed by it.
///
/// # Example
///
/// ```
/// use pgscope::{ModelMeta, Relation, SqlValue};
///
/// let users = ModelMeta::new("users").primary_key("id");
/// let (sql, params) = Relation::new(users)
///     .where_raw("\"users\".\"active\" = ?", vec![SqlValue::Bool(true)])
///     .order_by("-id")
///     .limit(10)
///     .to_postgres();
///
/// assert_eq!(
///     sql,
///     r#"SELECT "users".* FROM "users" WHERE "users"."active" = $1 ORDER BY "users"."id" DESC LIMIT 10"#
/// );
/// assert_eq!(params, vec![SqlValue::Bool(true)]);
/// ```
#[derive(Debug, Clone)]
pub struct Relation {
    /// The model this relation selects from
    model: Arc<ModelMeta>,
    /// Columns to select (None = all)
    select_columns: Option<Vec<String>>,
    /// Extra select-list expressions
    select_exprs: Vec<(String, Vec<SqlValue>)>,
    /// JOIN clauses, rendered verbatim
    joins: Vec<String>,
    /// WHERE conditions (combined with AND)
    conditions: Vec<Condition>,
    /// ORDER BY fragments
    order_by: Vec<String>,
    /// LIMIT clause
    limit: Option<i64>,
    /// OFFSET clause
    offset: Option<i64>,
    /// Whether to select distinct rows
    distinct: bool,
}

impl Relation {
    /// Creates an unrestricted relation on the model's table.
    pub fn new(model: impl Into<Arc<ModelMeta>>) -> Self {
        Self {
            model: model.into(),
            select_columns: None,
            select_exprs: Vec::new(),
            joins: Vec::new(),
            conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
        }
    }

    /// Returns a relation with no results.
    pub fn none(model: impl Into<Arc<ModelMeta>>) -> Self {
        Self::new(model).where_raw("1=0", vec![])
    }

    /// Returns the model metadata.
    pub fn model(&self) -> &ModelMeta {
        &self.model
    }

    /// Returns a shared handle to the model metadata.
    pub fn model_arc(&self) -> Arc<ModelMeta> {
        Arc::clone(&self.model)
    }

    /// Returns the quoted table name.
    pub fn quoted_table(&self) -> String {
        PostgresDialect::new().quote_table_name(&self.model.table_name)
    }

    /// Returns the accumulated WHERE conditions.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns the accumulated JOIN clauses.
    pub fn joins(&self) -> &[String] {
        &self.joins
    }

    /// Returns the accumulated ORDER BY fragments.
    pub fn order_clauses(&self) -> &[String] {
        &self.order_by
    }

    /// Appends a raw SQL condition with `?` placeholders.
    ///
    /// **Warning**: pass caller values as `params`, never inside `sql`.
    #[must_use]
    pub fn where_raw(mut self, sql: &str, params: Vec<SqlValue>) -> Self {
        self.conditions.push(Condition::Sql {
            sql: sql.to_string(),
            params,
        });
        self
    }

    /// Adds a structured filter. Multiple conditions are combined with AND.
    #[must_use]
    pub fn filter(mut self, q: Q) -> Self {
        self.conditions.push(Condition::Filter(q.into_expr()));
        self
    }

    /// Adds a negated structured filter.
    #[must_use]
    pub fn exclude(mut self, q: Q) -> Self {
        self.conditions.push(Condition::Filter(q.not().into_expr()));
        self
    }

    /// Appends a JOIN clause verbatim.
    #[must_use]
    pub fn join_raw(mut self, sql: &str) -> Self {
        self.joins.push(sql.to_string());
        self
    }

    /// Adds ordering on a column of this table.
    ///
    /// Use `-` prefix for descending order.
    #[must_use]
    pub fn order_by(mut self, spec: &str) -> Self {
        let order = OrderBy::parse(spec).to_sql(&self.model.table_name);
        self.order_by.push(order);
        self
    }

    /// Appends a raw ORDER BY fragment such as `"position" ASC`.
    #[must_use]
    pub fn order_raw(mut self, sql: &str) -> Self {
        self.order_by.push(sql.to_string());
        self
    }

    /// Clears all ordering.
    #[must_use]
    pub fn order_clear(mut self) -> Self {
        self.order_by.clear();
        self
    }

    /// Selects specific columns of this table.
    #[must_use]
    pub fn only(mut self, columns: &[&str]) -> Self {
        self.select_columns = Some(columns.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// Appends an expression to the select list.
    #[must_use]
    pub fn select_raw(mut self, sql: &str, params: Vec<SqlValue>) -> Self {
        self.select_exprs.push((sql.to_string(), params));
        self
    }

    /// Limits the number of results.
    #[must_use]
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Sets the offset for pagination.
    #[must_use]
    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Makes the query return distinct rows.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Renders the AND-combined WHERE predicate, or `None` when unrestricted.
    ///
    /// With more than one condition each is wrapped in parentheses, so an
    /// OR inside a raw fragment cannot leak into its neighbours.
    pub fn where_predicate(&self) -> Option<(String, Vec<SqlValue>)> {
        if self.conditions.is_empty() {
            return None;
        }
        let wrap = self.conditions.len() > 1;
        let mut params = Vec::new();
        let parts: Vec<String> = self
            .conditions
            .iter()
            .map(|condition| {
                let (sql, condition_params) = condition.render();
                params.extend(condition_params);
                if wrap {
                    format!("({sql})")
                } else {
                    sql
                }
            })
            .collect();
        Some((parts.join(" AND "), params))
    }

    /// Builds the SELECT statement with `?` placeholders.
    pub fn build_select(&self) -> (String, Vec<SqlValue>) {
        let table = self.quoted_table();
        let dialect = PostgresDialect::new();
        let mut sql = String::new();
        let mut params = Vec::new();

        sql.push_str("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }

        let mut items: Vec<String> = match &self.select_columns {
            Some(cols) => cols
                .iter()
                .map(|c| dialect.qualified_column(&self.model.table_name, c))
                .collect(),
            None => vec![format!("{table}.*")],
        };
        for (expr, expr_params) in &self.select_exprs {
            items.push(expr.clone());
            params.extend(expr_params.iter().cloned());
        }
        sql.push_str(&items.join(", "));

        sql.push_str(" FROM ");
        sql.push_str(&table);
        self.push_joins_and_where(&mut sql, &mut params);

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        (sql, params)
    }

    /// Builds the SQL COUNT query with `?` placeholders.
    pub fn build_count(&self) -> (String, Vec<SqlValue>) {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.quoted_table());
        let mut params = Vec::new();
        self.push_joins_and_where(&mut sql, &mut params);
        (sql, params)
    }

    /// Builds the SELECT statement with PostgreSQL `$n` placeholders.
    pub fn to_postgres(&self) -> (String, Vec<SqlValue>) {
        let (sql, params) = self.build_select();
        (PostgresDialect::new().number_placeholders(&sql), params)
    }

    /// Builds the COUNT statement with PostgreSQL `$n` placeholders.
    pub fn to_postgres_count(&self) -> (String, Vec<SqlValue>) {
        let (sql, params) = self.build_count();
        (PostgresDialect::new().number_placeholders(&sql), params)
    }

    fn push_joins_and_where(&self, sql: &mut String, params: &mut Vec<SqlValue>) {
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if let Some((predicate, where_params)) = self.where_predicate() {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate);
            params.extend(where_params);
        }
    }
}
