//! Tests for the `#[derive(Model)]` macro output.

use pgscope::{ColumnDescriptor, Model, PgScopes};

#[allow(dead_code)]
#[derive(Debug, Clone, Model)]
#[model(table = "users")]
struct User {
    #[column(primary_key)]
    id: i64,
    email: Option<String>,
    permissions: Vec<String>,
    #[column(name = "lucky", sql_type = "smallint[]")]
    lucky_numbers: Vec<i32>,
    avatar: Vec<u8>,
    #[column(skip)]
    cached_label: String,
}

#[allow(dead_code)]
#[derive(Model)]
struct UserGroup {
    id: i32,
    score: f64,
}

#[test]
fn derive_collects_columns_and_types() {
    let meta = User::meta();
    assert_eq!(meta.table_name, "users");
    assert_eq!(meta.primary_key.as_deref(), Some("id"));
    assert_eq!(
        meta.columns,
        vec![
            ColumnDescriptor::new("id", "bigint"),
            ColumnDescriptor::new("email", "text"),
            ColumnDescriptor::new("permissions", "text[]"),
            ColumnDescriptor::new("lucky", "smallint[]"),
            ColumnDescriptor::new("avatar", "bytea"),
        ]
    );
    assert_eq!(User::TABLE_NAME, "users");
}

#[test]
fn derive_defaults_table_name_to_snake_case() {
    let meta = UserGroup::meta();
    assert_eq!(meta.table_name, "user_group");
    assert_eq!(meta.primary_key, None);
    assert_eq!(meta.column_names(), vec!["id", "score"]);
    assert_eq!(meta.find_column("score").unwrap().sql_type, "double precision");
}

#[test]
fn derived_scope_uses_declared_casts() {
    let scoped = User::scope().contains_any("lucky", vec![1, 2]).unwrap();
    let (sql, _) = scoped.to_postgres();
    assert_eq!(
        sql,
        r#"SELECT "users".* FROM "users" WHERE "users"."lucky" && ARRAY[$1, $2]::smallint[]"#
    );
}

#[test]
fn renamed_field_is_not_known_by_its_rust_name() {
    assert!(User::scope().contains_any("lucky_numbers", 1).is_err());
}
