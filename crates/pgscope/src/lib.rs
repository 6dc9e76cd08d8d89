//! # pgscope
//!
//! PostgreSQL query scopes for array columns, large set membership,
//! OR-merged relations and association subqueries.
//!
//! This crate provides:
//! - `Relation` for lazy, chainable queries on one table
//! - `PgScopes` with `contains_all`, `contains_any`,
//!   `any_column_contains_all`, `member_of_set` and `merge_with_or`
//! - `AssociationDescriptor` and `build_association_scope` for
//!   has-and-belongs-to-many, has-many and belongs-to associations
//! - `JsonSelect` for rendering rows and nested associations as JSON
//! - `#[derive(Model)]` and catalog introspection for table metadata
//!
//! ## Quick Start
//!
//! ```
//! use pgscope::{ModelMeta, PgScopes, Relation, SqlValue};
//!
//! let users = Relation::new(
//!     ModelMeta::new("users")
//!         .primary_key("id")
//!         .column("id", "bigint")
//!         .column("permissions", "text[]"),
//! );
//!
//! let managers = users.contains_all("permissions", vec!["manage_users"]).unwrap();
//! let (sql, params) = managers.to_postgres();
//! assert_eq!(
//!     sql,
//!     r#"SELECT "users".* FROM "users" WHERE "users"."permissions" @> ARRAY[$1]::text[]"#
//! );
//! assert_eq!(params, vec![SqlValue::Text("manage_users".into())]);
//! ```
//!
//! ## Running Queries
//!
//! ```ignore
//! use pgscope::PgScopes;
//! use sqlx::PgPool;
//!
//! async fn example(pool: &PgPool) -> pgscope::Result<()> {
//!     let users = pgscope::introspect::load_model_meta(pool, "users").await?;
//!     let ids = pgscope::Relation::new(users)
//!         .member_of_set("id", vec![1, 2, 3])?
//!         .pluck_ids(pool)
//!         .await?;
//!     Ok(())
//! }
//! ```

mod association;
mod error;
mod exec;
pub mod introspect;
mod json;
mod model;
pub mod query;
mod relation;
pub mod scopes;

pub use association::{build_association_scope, AssociationDescriptor, AssociationKind, Outside};
pub use error::{Result, ScopeError};
pub use exec::{execute_raw, PreparedScope};
pub use introspect::{load_model_meta, SchemaCache};
pub use json::JsonSelect;
pub use model::Model;
pub use query::Q;
pub use relation::{Condition, OrderBy, OrderDirection, Relation};
pub use scopes::{ColumnSet, JoinType, PgScopes};

pub use pgscope_derive::Model;

// Re-export commonly used types from pgscope-core
pub use pgscope_core::{
    dedup_values, ColumnDescriptor, Dialect, ModelMeta, PostgresDialect, SqlValue, ToSqlValue,
    Values,
};
