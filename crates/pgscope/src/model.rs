//! Model trait.
//!
//! A model is a Rust type that knows its table's [`ModelMeta`]. It is
//! usually derived:
//!
//! ```
//! use pgscope::{Model, PgScopes};
//!
//! #[derive(Model)]
//! #[model(table = "users")]
//! struct User {
//!     #[column(primary_key)]
//!     id: i64,
//!     permissions: Vec<String>,
//! }
//!
//! let (sql, _) = User::scope()
//!     .contains_all("permissions", vec!["admin"])
//!     .unwrap()
//!     .to_postgres();
//! assert_eq!(
//!     sql,
//!     r#"SELECT "users".* FROM "users" WHERE "users"."permissions" @> ARRAY[$1]::text[]"#
//! );
//! ```

use pgscope_core::ModelMeta;

use crate::relation::Relation;

/// A type backed by a database table.
pub trait Model {
    /// The SQL table name.
    const TABLE_NAME: &'static str;

    /// Returns the table metadata.
    fn meta() -> ModelMeta;

    /// Returns an unrestricted relation on the table.
    fn scope() -> Relation {
        Relation::new(Self::meta())
    }
}
