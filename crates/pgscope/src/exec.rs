//! Handing relations to sqlx and running them against PostgreSQL.

use pgscope_core::{Dialect, PostgresDialect, SqlValue};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, PgPool, Postgres};
use tracing::debug;

use crate::error::Result;
use crate::json::JsonSelect;
use crate::relation::Relation;

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;
type PgQueryAs<'q, M> = sqlx::query::QueryAs<'q, Postgres, M, PgArguments>;
type PgQueryScalar<'q, O> = sqlx::query::QueryScalar<'q, Postgres, O, PgArguments>;

/// A rendered statement with `$n` placeholders and its parameters.
///
/// ```
/// use pgscope::{ModelMeta, PgScopes, Relation};
///
/// let users = Relation::new(ModelMeta::new("users").column("roles", "text[]"));
/// let prepared = users.contains_any("roles", vec!["admin", "ops"]).unwrap().prepare();
/// assert!(prepared.sql().ends_with("ARRAY[$1, $2]::text[]"));
/// assert_eq!(prepared.params().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedScope {
    sql: String,
    params: Vec<SqlValue>,
}

impl PreparedScope {
    /// Renders `sql` (with `?` placeholders) for PostgreSQL.
    pub fn new(sql: &str, params: Vec<SqlValue>) -> Self {
        Self {
            sql: PostgresDialect::new().number_placeholders(sql),
            params,
        }
    }

    /// Returns the SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the parameters in placeholder order.
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Returns a sqlx query with every parameter bound.
    pub fn query(&self) -> PgQuery<'_> {
        let mut query = sqlx::query(&self.sql);
        for param in &self.params {
            query = bind_param_raw(query, param.clone());
        }
        query
    }

    /// Returns a sqlx query mapping rows to `M`.
    pub fn query_as<M>(&self) -> PgQueryAs<'_, M>
    where
        M: for<'r> FromRow<'r, PgRow>,
    {
        let mut query = sqlx::query_as::<_, M>(&self.sql);
        for param in &self.params {
            query = bind_param(query, param.clone());
        }
        query
    }

    /// Returns a sqlx query reading the first column as `O`.
    pub fn query_scalar<O>(&self) -> PgQueryScalar<'_, O>
    where
        (O,): for<'r> FromRow<'r, PgRow>,
    {
        let mut query = sqlx::query_scalar::<_, O>(&self.sql);
        for param in &self.params {
            query = bind_scalar(query, param.clone());
        }
        query
    }
}

impl Relation {
    /// Renders the SELECT statement for execution.
    pub fn prepare(&self) -> PreparedScope {
        let (sql, params) = self.build_select();
        PreparedScope::new(&sql, params)
    }

    /// Executes the query and returns all matching rows.
    pub async fn fetch_all<M>(&self, pool: &PgPool) -> Result<Vec<M>>
    where
        M: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let prepared = self.prepare();
        debug!(sql = %prepared.sql, params = prepared.params.len(), "Executing relation");
        Ok(prepared.query_as::<M>().fetch_all(pool).await?)
    }

    /// Returns the first row, or `None` when nothing matches.
    pub async fn first<M>(&self, pool: &PgPool) -> Result<Option<M>>
    where
        M: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let prepared = self.clone().limit(1).prepare();
        Ok(prepared.query_as::<M>().fetch_optional(pool).await?)
    }

    /// Counts the matching rows.
    pub async fn count(&self, pool: &PgPool) -> Result<i64> {
        let (sql, params) = self.build_count();
        let prepared = PreparedScope::new(&sql, params);
        Ok(prepared.query_scalar::<i64>().fetch_one(pool).await?)
    }

    /// Returns whether any row matches.
    pub async fn exists(&self, pool: &PgPool) -> Result<bool> {
        Ok(self.count(pool).await? > 0)
    }

    /// Returns the primary keys of the matching rows as `i64`.
    ///
    /// Falls back to `id` when the model declares no primary key.
    pub async fn pluck_ids(&self, pool: &PgPool) -> Result<Vec<i64>> {
        let prepared = self.id_projection().prepare();
        Ok(prepared.query_scalar::<i64>().fetch_all(pool).await?)
    }

    /// Projects only the primary key, cast to `bigint` so `integer` and
    /// `serial` keys decode as `i64`.
    fn id_projection(&self) -> Self {
        let model = self.model();
        let primary_key = model.primary_key.as_deref().unwrap_or("id");
        let column = PostgresDialect::new().qualified_column(&model.table_name, primary_key);
        self.clone()
            .only(&[])
            .select_raw(&format!("{column}::bigint"), Vec::new())
    }
}

impl JsonSelect {
    /// Fetches every row as one JSON array.
    pub async fn fetch_array(&self, pool: &PgPool) -> Result<serde_json::Value> {
        let (sql, params) = self.to_array_sql()?;
        let prepared = PreparedScope { sql, params };
        Ok(prepared.query_scalar::<serde_json::Value>().fetch_one(pool).await?)
    }

    /// Fetches the first row as a JSON object, or `None` when nothing matches.
    pub async fn fetch_row(&self, pool: &PgPool) -> Result<Option<serde_json::Value>> {
        let (sql, params) = self.to_row_sql()?;
        let prepared = PreparedScope { sql, params };
        Ok(prepared
            .query_scalar::<serde_json::Value>()
            .fetch_optional(pool)
            .await?)
    }
}

/// Runs a raw statement with `?` placeholders and returns the affected row
/// count.
pub async fn execute_raw(pool: &PgPool, sql: &str, params: Vec<SqlValue>) -> Result<u64> {
    let prepared = PreparedScope::new(sql, params);
    Ok(prepared.query().execute(pool).await?.rows_affected())
}

fn bind_param<M>(query: PgQueryAs<'_, M>, value: SqlValue) -> PgQueryAs<'_, M> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

fn bind_param_raw(query: PgQuery<'_>, value: SqlValue) -> PgQuery<'_> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

fn bind_scalar<O>(query: PgQueryScalar<'_, O>, value: SqlValue) -> PgQueryScalar<'_, O> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}
