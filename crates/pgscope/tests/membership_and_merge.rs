//! Set membership and OR-merging of relations.

mod common;

use common::{text, users, where_sql};
use pgscope::scopes::{member_of_set, merge_with_or};
use pgscope::{PgScopes, Q, ScopeError, SqlValue, Values};

#[test]
fn member_of_set_renders_values_list() {
    let scoped = users().member_of_set("id", vec![5, 7]).unwrap();
    let (sql, params) = scoped.to_postgres();
    assert_eq!(
        sql,
        r#"SELECT "users".* FROM "users" WHERE "users"."id" = ANY(VALUES (5),(7))"#
    );
    assert!(params.is_empty());
}

#[test]
fn member_of_set_dedups_and_flattens() {
    let scoped = users()
        .member_of_set("id", vec![vec![3, 3], vec![1, 3]])
        .unwrap();
    assert_eq!(where_sql(&scoped), r#""users"."id" = ANY(VALUES (3),(1))"#);
}

#[test]
fn member_of_set_scalar_is_invalid() {
    assert!(matches!(
        users().member_of_set("id", 5),
        Err(ScopeError::InvalidArgument(_))
    ));
}

#[test]
fn member_of_set_empty_list_matches_nothing() {
    let scoped = member_of_set(&users(), "id", Values::empty()).unwrap();
    assert_eq!(where_sql(&scoped), "1=0");
}

#[test]
fn member_of_set_text_with_placeholder_char_is_not_renumbered() {
    let scoped = users().member_of_set("email", vec!["a?b"]).unwrap();
    let (sql, params) = scoped
        .where_raw(r#""users"."id" = ?"#, vec![SqlValue::Int(1)])
        .to_postgres();
    assert!(sql.contains("ANY(VALUES ('a?b'))"));
    assert!(sql.ends_with(r#"("users"."id" = $1)"#));
    assert_eq!(params, vec![SqlValue::Int(1)]);
}

fn email_is(email: &str) -> pgscope::Relation {
    users().where_raw(r#""users"."email" = ?"#, vec![text(email)])
}

#[test]
fn merge_with_or_combines_conditions() {
    let merged = users()
        .merge_with_or(&[email_is("a@x"), email_is("b@x")])
        .unwrap();
    let (sql, params) = merged.to_postgres();
    assert_eq!(
        sql,
        r#"SELECT "users".* FROM "users" WHERE ("users"."email" = $1) OR ("users"."email" = $2)"#
    );
    assert_eq!(params, vec![text("a@x"), text("b@x")]);
}

#[test]
fn merge_with_or_accepts_scoped_relations() {
    let admins = users().contains_all("permissions", "admin").unwrap();
    let lucky = users().contains_any("lucky_numbers", vec![7]).unwrap();
    let merged = merge_with_or(&users(), &[admins, lucky]).unwrap();
    assert_eq!(
        where_sql(&merged),
        r#"("users"."permissions" @> ARRAY[?]::text[]) OR ("users"."lucky_numbers" && ARRAY[?]::integer[])"#
    );
    assert_eq!(
        merged.where_predicate().unwrap().1,
        vec![text("admin"), SqlValue::Int(7)]
    );
}

#[test]
fn merge_with_or_of_nothing_is_unrestricted() {
    let merged = merge_with_or(&users(), &[]).unwrap();
    assert_eq!(where_sql(&merged), "1=1");
}

#[test]
fn merge_with_or_rejects_structured_filters() {
    let structured = users().filter(Q::eq("email", "a@x"));
    assert!(matches!(
        users().merge_with_or(&[structured]),
        Err(ScopeError::InvalidArgument(_))
    ));
}

#[test]
fn merged_relation_composes_with_other_scopes() {
    let merged = users()
        .merge_with_or(&[email_is("a@x"), email_is("b@x")])
        .unwrap()
        .member_of_set("id", vec![1, 2])
        .unwrap();
    assert_eq!(
        where_sql(&merged),
        r#"(("users"."email" = ?) OR ("users"."email" = ?)) AND ("users"."id" = ANY(VALUES (1),(2)))"#
    );
}
