#![allow(dead_code)]

use pgscope::{AssociationDescriptor, ModelMeta, Relation, SqlValue};

pub fn users_meta() -> ModelMeta {
    ModelMeta::new("users")
        .primary_key("id")
        .column("id", "bigint")
        .column("email", "text")
        .column("permissions", "text[]")
        .column("roles", "character varying(64)[]")
        .column("lucky_numbers", "integer[]")
}

pub fn groups_meta() -> ModelMeta {
    ModelMeta::new("groups")
        .primary_key("id")
        .column("id", "bigint")
        .column("name", "text")
}

pub fn users() -> Relation {
    Relation::new(users_meta())
}

pub fn groups_of_user() -> AssociationDescriptor {
    AssociationDescriptor::has_and_belongs_to_many("groups", groups_meta())
        .join_table("groups_users")
        .foreign_key("user_id")
        .association_foreign_key("group_id")
}

pub fn text(value: &str) -> SqlValue {
    SqlValue::Text(value.to_string())
}

/// Renders a relation's single WHERE condition with `?` placeholders.
pub fn where_sql(relation: &Relation) -> String {
    relation
        .where_predicate()
        .map(|(sql, _)| sql)
        .unwrap_or_default()
}
