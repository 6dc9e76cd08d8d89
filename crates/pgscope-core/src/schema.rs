//! Schema metadata consumed by the scope builders.
//!
//! A [`ModelMeta`] describes one table: its name, primary key, and the
//! declared SQL type of every column. It can come from `#[derive(Model)]`,
//! from JSON, or from introspecting a live database.

use serde::{Deserialize, Serialize};

/// Metadata about a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// The SQL column name.
    pub name: String,
    /// The declared SQL type, e.g. `text[]`, `integer[]` or `bigint`.
    pub sql_type: String,
}

impl ColumnDescriptor {
    /// Creates a new column descriptor.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }

    /// Returns whether the declared type is an array type.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.sql_type.trim_end().ends_with("[]")
    }

    /// Returns the element type, with every trailing `[]` removed.
    #[must_use]
    pub fn element_type(&self) -> &str {
        let mut ty = self.sql_type.trim();
        while let Some(inner) = ty.strip_suffix("[]") {
            ty = inner.trim_end();
        }
        ty
    }

    /// Returns the type an array literal must be cast to when compared
    /// against this column: `<element_type>[]`.
    #[must_use]
    pub fn array_cast(&self) -> String {
        format!("{}[]", self.element_type())
    }
}

/// Metadata about a model's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// The SQL table name, optionally schema-qualified.
    pub table_name: String,
    /// The primary key column, if the table has a single-column one.
    #[serde(default)]
    pub primary_key: Option<String>,
    /// All columns in declaration order.
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
}

impl ModelMeta {
    /// Creates metadata for a table with no columns declared yet.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            primary_key: None,
            columns: Vec::new(),
        }
    }

    /// Sets the primary key column.
    #[must_use]
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.columns.push(ColumnDescriptor::new(name, sql_type));
        self
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns all column names in declaration order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Parses metadata from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a table.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_cast_from_array_type() {
        let col = ColumnDescriptor::new("permissions", "text[]");
        assert!(col.is_array());
        assert_eq!(col.element_type(), "text");
        assert_eq!(col.array_cast(), "text[]");
    }

    #[test]
    fn test_array_cast_from_element_type() {
        let col = ColumnDescriptor::new("score", "integer");
        assert!(!col.is_array());
        assert_eq!(col.array_cast(), "integer[]");
    }

    #[test]
    fn test_array_cast_keeps_type_modifiers() {
        let col = ColumnDescriptor::new("tags", "character varying(255)[]");
        assert_eq!(col.array_cast(), "character varying(255)[]");
        let grid = ColumnDescriptor::new("grid", "integer[][]");
        assert_eq!(grid.array_cast(), "integer[]");
    }

    #[test]
    fn test_model_meta_builder() {
        let meta = ModelMeta::new("users")
            .primary_key("id")
            .column("id", "bigint")
            .column("roles", "text[]");
        assert_eq!(meta.primary_key.as_deref(), Some("id"));
        assert_eq!(meta.column_names(), vec!["id", "roles"]);
        assert_eq!(meta.find_column("roles").map(|c| c.sql_type.as_str()), Some("text[]"));
        assert!(meta.find_column("missing").is_none());
    }

    #[test]
    fn test_model_meta_from_json() {
        let meta = ModelMeta::from_json(
            r#"{
                "table_name": "groups",
                "primary_key": "id",
                "columns": [{"name": "id", "sql_type": "integer"}]
            }"#,
        )
        .unwrap();
        assert_eq!(meta, ModelMeta::new("groups").primary_key("id").column("id", "integer"));

        let bare = ModelMeta::from_json(r#"{"table_name": "tags"}"#).unwrap();
        assert!(bare.primary_key.is_none());
        assert!(bare.columns.is_empty());
    }
}
