//! PostgreSQL-specific query scopes.
//!
//! Each scope takes a [`Relation`], appends one condition and returns a new
//! relation. Import [`PgScopes`] to call them as methods, or use the free
//! functions directly.
//!
//! ```
//! use pgscope::{JoinType, ModelMeta, PgScopes, Relation};
//!
//! let users = Relation::new(
//!     ModelMeta::new("users")
//!         .column("permissions", "text[]")
//!         .column("roles", "text[]"),
//! );
//!
//! let admins = users
//!     .any_column_contains_all(["permissions", "roles"], JoinType::Or, "admin")
//!     .unwrap();
//! let (sql, params) = admins.to_postgres();
//! assert_eq!(
//!     sql,
//!     r#"SELECT "users".* FROM "users" WHERE "users"."permissions" @> ARRAY[$1]::text[] OR "users"."roles" @> ARRAY[$2]::text[]"#
//! );
//! assert_eq!(params.len(), 2);
//! ```

mod array;
mod membership;
mod merge;

pub use array::{any_column_contains_all, array_predicate, contains_all, contains_any, ArrayOp};
pub use membership::member_of_set;
pub use merge::merge_with_or;

use pgscope_core::Values;
use std::collections::HashSet;
use std::fmt;

use crate::error::Result;
use crate::relation::Relation;

/// How per-column predicates are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    /// Every predicate must hold.
    #[default]
    And,
    /// At least one predicate must hold.
    Or,
}

impl JoinType {
    /// Returns the SQL keyword.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for JoinType {
    /// Renders the keyword with surrounding spaces, ready for joining.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " {} ", self.keyword())
    }
}

/// A column argument: one column, or a list of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSet {
    /// A single column.
    Single(String),
    /// A list of columns.
    List(Vec<String>),
}

impl From<&str> for ColumnSet {
    fn from(column: &str) -> Self {
        Self::Single(column.to_string())
    }
}

impl From<String> for ColumnSet {
    fn from(column: String) -> Self {
        Self::Single(column)
    }
}

impl<S: Into<String>> From<Vec<S>> for ColumnSet {
    fn from(columns: Vec<S>) -> Self {
        Self::List(columns.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for ColumnSet {
    fn from(columns: [S; N]) -> Self {
        Self::List(columns.into_iter().map(Into::into).collect())
    }
}

impl From<&[&str]> for ColumnSet {
    fn from(columns: &[&str]) -> Self {
        Self::List(columns.iter().map(|c| (*c).to_string()).collect())
    }
}

/// Drops repeated column names, keeping the first occurrence.
fn dedup_columns(columns: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    columns
        .into_iter()
        .filter(|c| seen.insert(c.clone()))
        .collect()
}

/// PostgreSQL scopes available on any [`Relation`].
pub trait PgScopes {
    /// Requires the array `column` to contain every value.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` for an unknown column.
    fn contains_all(&self, column: &str, values: impl Into<Values>) -> Result<Relation>;

    /// Requires the array `column` to share at least one value.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` for an unknown column.
    fn contains_any(&self, column: &str, values: impl Into<Values>) -> Result<Relation>;

    /// Requires each listed column to contain every value, joined by `join`.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` for a single column, an empty list or an
    /// unknown column.
    fn any_column_contains_all(
        &self,
        columns: impl Into<ColumnSet>,
        join: JoinType,
        values: impl Into<Values>,
    ) -> Result<Relation>;

    /// Requires `column` to equal one of `values`, via `= ANY(VALUES ...)`.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` when `values` is a scalar.
    fn member_of_set(&self, column: &str, values: impl Into<Values>) -> Result<Relation>;

    /// ORs together the conditions of `relations`.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` when a relation carries a structured
    /// filter.
    fn merge_with_or(&self, relations: &[Relation]) -> Result<Relation>;
}

impl PgScopes for Relation {
    fn contains_all(&self, column: &str, values: impl Into<Values>) -> Result<Relation> {
        contains_all(self, column, values)
    }

    fn contains_any(&self, column: &str, values: impl Into<Values>) -> Result<Relation> {
        contains_any(self, column, values)
    }

    fn any_column_contains_all(
        &self,
        columns: impl Into<ColumnSet>,
        join: JoinType,
        values: impl Into<Values>,
    ) -> Result<Relation> {
        any_column_contains_all(self, columns, join, values)
    }

    fn member_of_set(&self, column: &str, values: impl Into<Values>) -> Result<Relation> {
        member_of_set(self, column, values)
    }

    fn merge_with_or(&self, relations: &[Relation]) -> Result<Relation> {
        merge_with_or(self, relations)
    }
}
