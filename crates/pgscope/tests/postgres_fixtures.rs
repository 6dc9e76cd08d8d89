//! Checks against a live PostgreSQL server.
//!
//! Set `DATABASE_URL` to run them; without it every test returns early.
//! Fixtures live in temporary tables on a single pooled connection, so
//! nothing outlives the test.

use pgscope::{
    execute_raw, load_model_meta, AssociationDescriptor, JoinType, JsonSelect, Outside, PgScopes,
    Relation, SchemaCache, ScopeError, SqlValue,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

async fn connect() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("Failed to connect to DATABASE_URL");
    Some(pool)
}

async fn seed(pool: &PgPool) {
    let statements = [
        "CREATE TEMP TABLE users (id bigint PRIMARY KEY, email text, permissions text[] NOT NULL DEFAULT '{}', roles varchar(32)[] NOT NULL DEFAULT '{}', lucky integer[] NOT NULL DEFAULT '{}')",
        "CREATE TEMP TABLE groups (id bigint PRIMARY KEY, name text NOT NULL)",
        "CREATE TEMP TABLE groups_users (user_id bigint NOT NULL, group_id bigint NOT NULL)",
        "INSERT INTO users (id, email, permissions, roles, lucky) VALUES \
         (1, 'a@x', '{manage_users,manage_roles}', '{}', '{7}'), \
         (2, 'b@x', '{manage_users}', '{admin}', '{3,13}'), \
         (3, 'c@x', '{}', '{}', '{}'), \
         (5, 'e@x', '{read}', '{admin}', '{5}')",
        "INSERT INTO groups (id, name) VALUES (10, 'ops'), (11, 'dev'), (12, 'qa')",
        "INSERT INTO groups_users (user_id, group_id) VALUES (1, 10), (1, 11), (2, 12)",
    ];
    for sql in statements {
        execute_raw(pool, sql, vec![]).await.unwrap();
    }
}

async fn setup() -> Option<(PgPool, Relation)> {
    let pool = connect().await?;
    seed(&pool).await;
    let users = load_model_meta(&pool, "users").await.unwrap();
    Some((pool, Relation::new(users)))
}

async fn ids(pool: &PgPool, relation: Relation) -> Vec<i64> {
    relation.order_by("id").pluck_ids(pool).await.unwrap()
}

#[tokio::test]
async fn introspection_reads_types_and_primary_key() {
    let Some((_pool, users)) = setup().await else {
        return;
    };
    let meta = users.model();
    assert_eq!(meta.primary_key.as_deref(), Some("id"));
    assert_eq!(meta.find_column("permissions").unwrap().sql_type, "text[]");
    assert_eq!(
        meta.find_column("roles").unwrap().array_cast(),
        "character varying(32)[]"
    );
}

#[tokio::test]
async fn introspecting_a_missing_table_fails() {
    let Some(pool) = connect().await else {
        return;
    };
    let err = load_model_meta(&pool, "no_such_table").await.unwrap_err();
    assert!(matches!(err, ScopeError::Database(_)));
}

#[tokio::test]
async fn contains_all_and_any() {
    let Some((pool, users)) = setup().await else {
        return;
    };
    let all = users.contains_all("permissions", vec!["manage_users", "manage_roles"]).unwrap();
    assert_eq!(ids(&pool, all).await, vec![1]);

    let single = users.contains_all("permissions", "manage_users").unwrap();
    assert_eq!(ids(&pool, single).await, vec![1, 2]);

    let any = users.contains_any("lucky", vec![7, 13]).unwrap();
    assert_eq!(ids(&pool, any).await, vec![1, 2]);

    let none = users.contains_any("lucky", vec![99]).unwrap();
    assert!(ids(&pool, none).await.is_empty());
}

#[tokio::test]
async fn any_column_contains_all_or_and() {
    let Some((pool, users)) = setup().await else {
        return;
    };
    let either = users
        .any_column_contains_all(["permissions", "roles"], JoinType::Or, "admin")
        .unwrap();
    assert_eq!(ids(&pool, either).await, vec![2, 5]);

    let both = users
        .any_column_contains_all(["permissions", "roles"], JoinType::And, "manage_users")
        .unwrap();
    assert!(ids(&pool, both).await.is_empty());
}

#[tokio::test]
async fn member_of_set_finds_members() {
    let Some((pool, users)) = setup().await else {
        return;
    };
    let members = users.member_of_set("id", vec![5, 2, 2, 42]).unwrap();
    assert_eq!(ids(&pool, members).await, vec![2, 5]);

    let nobody = users.member_of_set("id", Vec::<i64>::new()).unwrap();
    assert_eq!(nobody.count(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn pluck_ids_reads_serial_keys() {
    let Some(pool) = connect().await else {
        return;
    };
    let statements = [
        "CREATE TEMP TABLE items (id serial PRIMARY KEY, tags text[] NOT NULL DEFAULT '{}')",
        "INSERT INTO items (tags) VALUES ('{a,b}'), ('{b}'), ('{a}')",
    ];
    for sql in statements {
        execute_raw(&pool, sql, vec![]).await.unwrap();
    }
    let items = Relation::new(load_model_meta(&pool, "items").await.unwrap());
    assert_eq!(items.model().find_column("id").unwrap().sql_type, "integer");

    let tagged = items.contains_all("tags", "a").unwrap();
    assert_eq!(ids(&pool, tagged).await, vec![1, 3]);
}

#[tokio::test]
async fn member_of_set_matches_non_finite_floats() {
    let Some(pool) = connect().await else {
        return;
    };
    let statements = [
        "CREATE TEMP TABLE readings (id bigint PRIMARY KEY, score float8 NOT NULL)",
        "INSERT INTO readings (id, score) VALUES (1, 'NaN'), (2, 'Infinity'), (3, '-Infinity'), (4, 1.5)",
    ];
    for sql in statements {
        execute_raw(&pool, sql, vec![]).await.unwrap();
    }
    let readings = Relation::new(load_model_meta(&pool, "readings").await.unwrap());

    let odd = readings
        .member_of_set("score", vec![f64::NAN, f64::INFINITY, f64::NEG_INFINITY])
        .unwrap();
    assert_eq!(ids(&pool, odd).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn merge_with_or_unions_results() {
    let Some((pool, users)) = setup().await else {
        return;
    };
    let first = users.clone().where_raw(r#""users"."email" = ?"#, vec![SqlValue::Text("a@x".into())]);
    let lucky = users.contains_any("lucky", vec![5]).unwrap();
    let merged = users.merge_with_or(&[first, lucky]).unwrap();
    assert_eq!(ids(&pool, merged).await, vec![1, 5]);
}

#[tokio::test]
async fn habtm_scope_returns_groups_of_user() {
    let Some((pool, users)) = setup().await else {
        return;
    };
    let groups_meta = load_model_meta(&pool, "groups").await.unwrap();
    let association = AssociationDescriptor::has_and_belongs_to_many("groups", groups_meta)
        .join_table("groups_users")
        .foreign_key("user_id")
        .association_foreign_key("group_id");

    let scope = association.scope(Outside::record(users.model(), 1)).unwrap();
    assert_eq!(ids(&pool, scope).await, vec![10, 11]);

    let scope = association.scope(Outside::record(users.model(), 3)).unwrap();
    assert!(!scope.exists(&pool).await.unwrap());
}

#[tokio::test]
async fn json_projection_nests_groups() {
    let Some((pool, users)) = setup().await else {
        return;
    };
    let groups_meta = load_model_meta(&pool, "groups").await.unwrap();
    let association = AssociationDescriptor::has_and_belongs_to_many("groups", groups_meta)
        .join_table("groups_users")
        .foreign_key("user_id")
        .association_foreign_key("group_id")
        .order(r#""groups"."id" ASC"#);

    let one = JsonSelect::new(users.clone().where_raw(r#""users"."id" = ?"#, vec![SqlValue::Int(1)]))
        .columns(&["id"])
        .include(association.clone())
        .fetch_row(&pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        one,
        serde_json::json!({"id": 1, "groups": [{"id": 10, "name": "ops"}, {"id": 11, "name": "dev"}]})
    );

    let lonely = JsonSelect::new(users.where_raw(r#""users"."id" = ?"#, vec![SqlValue::Int(3)]))
        .columns(&["id"])
        .include(association)
        .fetch_array(&pool)
        .await
        .unwrap();
    assert_eq!(lonely, serde_json::json!([{"id": 3, "groups": []}]));
}

#[tokio::test]
async fn schema_cache_loads_once_and_invalidates() {
    let Some((pool, _users)) = setup().await else {
        return;
    };
    let cache = SchemaCache::new();
    let first = cache.get_or_load(&pool, "groups").await.unwrap();
    let second = cache.get_or_load(&pool, "groups").await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    assert!(cache.invalidate("groups"));
    let reloaded = cache.get_or_load(&pool, "groups").await.unwrap();
    assert!(!std::sync::Arc::ptr_eq(&first, &reloaded));
    assert_eq!(*first, *reloaded);
}
