//! Association descriptors and the scopes they produce.
//!
//! An [`AssociationDescriptor`] is read-only metadata about a relationship
//! from an owning model to a target model. [`build_association_scope`]
//! turns it into a [`Relation`] on the target table, linked to the owner
//! either by a correlated column reference (for nesting inside a query on
//! the owner) or by a bound key (for one concrete owner row).

use pgscope_core::{Dialect, ModelMeta, PostgresDialect, SqlValue, ToSqlValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScopeError};
use crate::relation::Relation;

/// The kind of relationship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    /// Many-to-many through a join table.
    #[default]
    HasAndBelongsToMany,
    /// The target table holds a foreign key to the owner.
    HasMany,
    /// The owner holds a foreign key to the target.
    BelongsTo,
}

/// Metadata about an association from an owning model to `target`.
///
/// Key columns, by kind:
///
/// | kind | `foreign_key` | `association_foreign_key` | `primary_key` | `association_primary_key` |
/// |------|---------------|---------------------------|---------------|---------------------------|
/// | has-and-belongs-to-many | join table -> owner | join table -> target | owner | target |
/// | has-many | target -> owner | unused | owner | unused |
/// | belongs-to | owner -> target | unused | unused | target |
///
/// Unset primary keys fall back to the model metadata's primary key.
///
/// # Example
///
/// ```
/// use pgscope::{AssociationDescriptor, ModelMeta, Outside};
///
/// let users = ModelMeta::new("users").primary_key("id");
/// let groups = ModelMeta::new("groups").primary_key("id");
/// let groups_of_user = AssociationDescriptor::has_and_belongs_to_many("groups", groups)
///     .join_table("memberships")
///     .foreign_key("user_id")
///     .association_foreign_key("group_id")
///     .order("\"groups\".\"name\" ASC");
///
/// let (sql, params) = groups_of_user
///     .scope(Outside::record(&users, 5))
///     .unwrap()
///     .to_postgres();
/// assert_eq!(
///     sql,
///     r#"SELECT "groups".* FROM "groups" JOIN "memberships" ON "memberships"."group_id" = "groups"."id" WHERE "memberships"."user_id" = $1 ORDER BY "groups"."name" ASC"#
/// );
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationDescriptor {
    /// The association name, used as the key when nesting JSON.
    pub name: String,
    /// The relationship kind.
    #[serde(default)]
    pub kind: AssociationKind,
    /// The target model.
    pub target: ModelMeta,
    /// Join table for has-and-belongs-to-many.
    #[serde(default)]
    pub join_table: Option<String>,
    /// See the table above.
    #[serde(default)]
    pub foreign_key: Option<String>,
    /// Join-table column referencing the target.
    #[serde(default)]
    pub association_foreign_key: Option<String>,
    /// Owner's primary key.
    #[serde(default)]
    pub primary_key: Option<String>,
    /// Target's primary key.
    #[serde(default)]
    pub association_primary_key: Option<String>,
    /// Extra condition on the target, with `?` placeholders.
    #[serde(default)]
    pub conditions: Option<String>,
    /// Parameters for `conditions`.
    #[serde(default)]
    pub condition_params: Vec<SqlValue>,
    /// Declared ordering, rendered verbatim.
    #[serde(default)]
    pub order: Option<String>,
}

impl AssociationDescriptor {
    fn new(name: &str, kind: AssociationKind, target: ModelMeta) -> Self {
        Self {
            name: name.to_string(),
            kind,
            target,
            join_table: None,
            foreign_key: None,
            association_foreign_key: None,
            primary_key: None,
            association_primary_key: None,
            conditions: None,
            condition_params: Vec::new(),
            order: None,
        }
    }

    /// Declares a many-to-many association through a join table.
    pub fn has_and_belongs_to_many(name: &str, target: ModelMeta) -> Self {
        Self::new(name, AssociationKind::HasAndBelongsToMany, target)
    }

    /// Declares a one-to-many association.
    pub fn has_many(name: &str, target: ModelMeta) -> Self {
        Self::new(name, AssociationKind::HasMany, target)
    }

    /// Declares a many-to-one association.
    pub fn belongs_to(name: &str, target: ModelMeta) -> Self {
        Self::new(name, AssociationKind::BelongsTo, target)
    }

    /// Parses a descriptor from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Serialization`] for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the join table.
    #[must_use]
    pub fn join_table(mut self, table: &str) -> Self {
        self.join_table = Some(table.to_string());
        self
    }

    /// Sets the foreign key column.
    #[must_use]
    pub fn foreign_key(mut self, column: &str) -> Self {
        self.foreign_key = Some(column.to_string());
        self
    }

    /// Sets the join-table column referencing the target.
    #[must_use]
    pub fn association_foreign_key(mut self, column: &str) -> Self {
        self.association_foreign_key = Some(column.to_string());
        self
    }

    /// Sets the owner's primary key column.
    #[must_use]
    pub fn primary_key(mut self, column: &str) -> Self {
        self.primary_key = Some(column.to_string());
        self
    }

    /// Sets the target's primary key column.
    #[must_use]
    pub fn association_primary_key(mut self, column: &str) -> Self {
        self.association_primary_key = Some(column.to_string());
        self
    }

    /// Sets an extra condition on the target.
    #[must_use]
    pub fn conditions(mut self, sql: &str, params: Vec<SqlValue>) -> Self {
        self.conditions = Some(sql.to_string());
        self.condition_params = params;
        self
    }

    /// Sets the declared ordering.
    #[must_use]
    pub fn order(mut self, sql: &str) -> Self {
        self.order = Some(sql.to_string());
        self
    }

    /// Builds the scope for this association. See [`build_association_scope`].
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Configuration`] when required metadata is missing.
    pub fn scope(&self, outside: Outside<'_>) -> Result<Relation> {
        build_association_scope(self, outside)
    }

    fn require<'a>(&self, value: Option<&'a str>, field: &str) -> Result<&'a str> {
        value.filter(|v| !v.is_empty()).ok_or_else(|| {
            ScopeError::Configuration(format!(
                "association `{}` is missing {field}",
                self.name
            ))
        })
    }

    fn target_primary_key(&self) -> Result<&str> {
        self.require(
            self.association_primary_key
                .as_deref()
                .or(self.target.primary_key.as_deref()),
            "association_primary_key",
        )
    }

    fn owner_primary_key<'a>(&'a self, owner: &'a ModelMeta) -> Result<&'a str> {
        self.require(
            self.primary_key.as_deref().or(owner.primary_key.as_deref()),
            "primary_key",
        )
    }
}

/// The owning side an association scope is linked to.
#[derive(Debug, Clone)]
pub enum Outside<'a> {
    /// Correlate with the owner's table, for use inside a query on it.
    Table(&'a ModelMeta),
    /// Bind to one owner row.
    ///
    /// `key` is the value of the owner's linking column: its primary key for
    /// has-many and has-and-belongs-to-many, its foreign key for belongs-to.
    Record {
        /// The owner model.
        model: &'a ModelMeta,
        /// The linking value.
        key: SqlValue,
    },
}

impl<'a> Outside<'a> {
    /// Correlates with the owner's table.
    pub const fn table(model: &'a ModelMeta) -> Self {
        Self::Table(model)
    }

    /// Binds to one owner row.
    pub fn record(model: &'a ModelMeta, key: impl ToSqlValue) -> Self {
        Self::Record {
            model,
            key: key.to_sql_value(),
        }
    }

    /// Returns the owner model.
    pub fn model(&self) -> &'a ModelMeta {
        match self {
            Self::Table(model) | Self::Record { model, .. } => *model,
        }
    }
}

/// Builds the scope for `association` seen from `outside`.
///
/// For has-and-belongs-to-many the target table is joined to the join
/// table on `association_foreign_key = association_primary_key`, and linked
/// to the owner through `foreign_key`. Declared conditions are ANDed in and
/// declared ordering applied. Nothing is executed.
///
/// # Errors
///
/// Returns [`ScopeError::Configuration`] when a required table or key name
/// is missing from the descriptor and the model metadata.
pub fn build_association_scope(
    association: &AssociationDescriptor,
    outside: Outside<'_>,
) -> Result<Relation> {
    let dialect = PostgresDialect::new();
    let target = &association.target;
    let owner = outside.model();
    let mut relation = Relation::new(target.clone());

    match association.kind {
        AssociationKind::HasAndBelongsToMany => {
            let join_table = association.require(association.join_table.as_deref(), "join_table")?;
            let foreign_key = association.require(association.foreign_key.as_deref(), "foreign_key")?;
            let association_foreign_key = association.require(
                association.association_foreign_key.as_deref(),
                "association_foreign_key",
            )?;
            let association_primary_key = association.target_primary_key()?;

            relation = relation.join_raw(&format!(
                "JOIN {} ON {} = {}",
                dialect.quote_table_name(join_table),
                dialect.qualified_column(join_table, association_foreign_key),
                dialect.qualified_column(&target.table_name, association_primary_key)
            ));
            let link = dialect.qualified_column(join_table, foreign_key);
            relation = match outside {
                Outside::Table(owner) => {
                    let primary_key = association.owner_primary_key(owner)?;
                    relation.where_raw(
                        &format!("{} = {link}", dialect.qualified_column(&owner.table_name, primary_key)),
                        vec![],
                    )
                }
                Outside::Record { key, .. } => relation.where_raw(&format!("{link} = ?"), vec![key]),
            };
        }
        AssociationKind::HasMany => {
            let foreign_key = association.require(association.foreign_key.as_deref(), "foreign_key")?;
            let link = dialect.qualified_column(&target.table_name, foreign_key);
            relation = match outside {
                Outside::Table(owner) => {
                    let primary_key = association.owner_primary_key(owner)?;
                    relation.where_raw(
                        &format!("{} = {link}", dialect.qualified_column(&owner.table_name, primary_key)),
                        vec![],
                    )
                }
                Outside::Record { key, .. } => relation.where_raw(&format!("{link} = ?"), vec![key]),
            };
        }
        AssociationKind::BelongsTo => {
            let association_primary_key = association.target_primary_key()?;
            let link = dialect.qualified_column(&target.table_name, association_primary_key);
            relation = match outside {
                Outside::Table(owner) => {
                    let foreign_key = association.require(association.foreign_key.as_deref(), "foreign_key")?;
                    relation.where_raw(
                        &format!("{} = {link}", dialect.qualified_column(&owner.table_name, foreign_key)),
                        vec![],
                    )
                }
                Outside::Record { key, .. } => relation.where_raw(&format!("{link} = ?"), vec![key]),
            };
        }
    }

    if let Some(conditions) = association.conditions.as_deref().filter(|c| !c.is_empty()) {
        relation = relation.where_raw(conditions, association.condition_params.clone());
    }
    if let Some(order) = association.order.as_deref().filter(|o| !o.is_empty()) {
        relation = relation.order_raw(order);
    }

    debug!(
        association = %association.name,
        kind = ?association.kind,
        owner = %owner.table_name,
        target = %target.table_name,
        "Built association scope"
    );
    Ok(relation)
}
