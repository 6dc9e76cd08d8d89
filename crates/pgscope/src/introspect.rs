//! Loading model metadata from the PostgreSQL catalog.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use pgscope_core::{ColumnDescriptor, ModelMeta};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::{Result, ScopeError};

const COLUMNS_SQL: &str = "SELECT a.attname::text, format_type(a.atttypid, a.atttypmod) \
     FROM pg_attribute a \
     WHERE a.attrelid = $1::regclass AND a.attnum > 0 AND NOT a.attisdropped \
     ORDER BY a.attnum";

const PRIMARY_KEY_SQL: &str = "SELECT a.attname::text \
     FROM pg_index i \
     JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey) \
     WHERE i.indrelid = $1::regclass AND i.indisprimary";

/// Reads the columns and primary key of `table`.
///
/// `table` may be schema-qualified. A composite primary key is left unset,
/// since association keys are single columns.
///
/// # Errors
///
/// Returns [`ScopeError::Database`] if the table does not exist, and
/// [`ScopeError::Configuration`] if it has no columns.
pub async fn load_model_meta(pool: &PgPool, table: &str) -> Result<ModelMeta> {
    let rows: Vec<(String, String)> = sqlx::query_as(COLUMNS_SQL)
        .bind(table)
        .fetch_all(pool)
        .await?;
    if rows.is_empty() {
        return Err(ScopeError::Configuration(format!(
            "table `{table}` has no columns"
        )));
    }

    let key_columns: Vec<String> = sqlx::query_scalar(PRIMARY_KEY_SQL)
        .bind(table)
        .fetch_all(pool)
        .await?;

    let mut meta = ModelMeta::new(table);
    meta.columns = rows
        .into_iter()
        .map(|(name, sql_type)| ColumnDescriptor::new(&name, &sql_type))
        .collect();
    if let [primary_key] = key_columns.as_slice() {
        meta.primary_key = Some(primary_key.clone());
    }

    info!(
        table,
        columns = meta.columns.len(),
        primary_key = meta.primary_key.as_deref().unwrap_or("-"),
        "Loaded model metadata"
    );
    Ok(meta)
}

/// A process-wide cache of introspected metadata, keyed by table name.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<String, Arc<ModelMeta>>>,
}

impl SchemaCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached metadata for `table`, if any.
    pub fn get(&self, table: &str) -> Option<Arc<ModelMeta>> {
        self.read().get(table).cloned()
    }

    /// Stores metadata, replacing any previous entry for its table.
    pub fn insert(&self, meta: ModelMeta) -> Arc<ModelMeta> {
        let meta = Arc::new(meta);
        self.write().insert(meta.table_name.clone(), Arc::clone(&meta));
        meta
    }

    /// Returns the cached metadata for `table`, loading it on a miss.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`load_model_meta`].
    pub async fn get_or_load(&self, pool: &PgPool, table: &str) -> Result<Arc<ModelMeta>> {
        if let Some(meta) = self.get(table) {
            debug!(table, "Schema cache hit");
            return Ok(meta);
        }
        let meta = load_model_meta(pool, table).await?;
        Ok(self.insert(meta))
    }

    /// Drops the entry for `table`, returning whether one existed.
    pub fn invalidate(&self, table: &str) -> bool {
        self.write().remove(table).is_some()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Returns the number of cached tables.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic elsewhere cannot leave a half-written entry, so a poisoned
    // lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<ModelMeta>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<ModelMeta>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
