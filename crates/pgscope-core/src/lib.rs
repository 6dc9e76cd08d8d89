//! # pgscope-core
//!
//! Building blocks shared by the `pgscope` query scopes.
//!
//! This crate provides:
//! - [`SqlValue`] parameters and the [`Values`] array argument with its
//!   explicit flattening step
//! - [`PostgresDialect`] identifier quoting and `$n` placeholder rendering
//! - [`ModelMeta`] / [`ColumnDescriptor`] schema metadata, including the
//!   array cast derived from a column's declared type
//!
//! ```rust
//! use pgscope_core::{ColumnDescriptor, Dialect, PostgresDialect};
//!
//! let dialect = PostgresDialect::new();
//! let roles = ColumnDescriptor::new("roles", "text[]");
//!
//! let fragment = format!(
//!     "{} @> ARRAY[?]::{}",
//!     dialect.qualified_column("users", &roles.name),
//!     roles.array_cast()
//! );
//! assert_eq!(fragment, r#""users"."roles" @> ARRAY[?]::text[]"#);
//! ```

pub mod dialect;
pub mod schema;
pub mod value;

pub use dialect::{Dialect, PostgresDialect};
pub use schema::{ColumnDescriptor, ModelMeta};
pub use value::{dedup_values, SqlValue, ToSqlValue, Values};
