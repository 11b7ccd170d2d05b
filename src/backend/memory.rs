//! In-memory backend: an ordered sequence of records keyed by an auto-incrementing integer.

use crate::backend::{CrudBackend, ListQuery, ListResult};
use crate::config::{PkType, ResolvedRouter};
use crate::error::{AppError, ConfigError};
use crate::query::sort_records;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

struct Table {
    rows: Vec<Map<String, Value>>,
    next_id: i64,
}

pub struct MemoryBackend {
    pk: String,
    inner: RwLock<Table>,
}

impl MemoryBackend {
    pub fn new(pk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            inner: RwLock::new(Table {
                rows: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Backend for a resolved router; the primary key must be an integer.
    pub fn for_router(router: &ResolvedRouter) -> Result<Self, ConfigError> {
        if router.pk_type != PkType::Int {
            return Err(ConfigError::InvalidPrimaryKey {
                schema: router.schema.name.clone(),
                field: router.pk.clone(),
            });
        }
        Ok(Self::new(router.pk.clone()))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Table>, AppError> {
        self.inner
            .read()
            .map_err(|_| AppError::Backend("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Table>, AppError> {
        self.inner
            .write()
            .map_err(|_| AppError::Backend("memory store lock poisoned".into()))
    }

    fn position(&self, table: &Table, id: &Value) -> Option<usize> {
        let id = id.as_i64()?;
        table
            .rows
            .iter()
            .position(|r| r.get(&self.pk).and_then(Value::as_i64) == Some(id))
    }
}

#[async_trait]
impl CrudBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, query: &ListQuery) -> Result<ListResult, AppError> {
        let table = self.read()?;
        let mut rows: Vec<Map<String, Value>> = table
            .rows
            .iter()
            .filter(|r| query.filters.iter().all(|f| f.matches(r)))
            .cloned()
            .collect();
        drop(table);

        if !query.sort.is_empty() {
            sort_records(&mut rows, &query.sort, &self.pk);
        }
        let total = rows.len() as u64;
        let items = match query.window {
            Some(w) => rows
                .into_iter()
                .skip(usize::try_from(w.offset).unwrap_or(usize::MAX))
                .take(usize::try_from(w.limit).unwrap_or(usize::MAX))
                .map(Value::Object)
                .collect(),
            None => rows.into_iter().map(Value::Object).collect(),
        };
        Ok(ListResult { items, total })
    }

    async fn get(&self, id: &Value) -> Result<Option<Value>, AppError> {
        let table = self.read()?;
        Ok(self
            .position(&table, id)
            .map(|i| Value::Object(table.rows[i].clone())))
    }

    async fn create(&self, mut body: Map<String, Value>) -> Result<Value, AppError> {
        let mut table = self.write()?;
        let id = table.next_id;
        table.next_id += 1;
        body.insert(self.pk.clone(), Value::Number(id.into()));
        table.rows.push(body.clone());
        tracing::debug!(id, "memory: created");
        Ok(Value::Object(body))
    }

    async fn update(&self, id: &Value, body: Map<String, Value>) -> Result<Option<Value>, AppError> {
        let mut table = self.write()?;
        let Some(i) = self.position(&table, id) else {
            return Ok(None);
        };
        let row = &mut table.rows[i];
        for (k, v) in body {
            if k != self.pk {
                row.insert(k, v);
            }
        }
        tracing::debug!(id = %id, "memory: updated");
        Ok(Some(Value::Object(row.clone())))
    }

    async fn delete_one(&self, id: &Value) -> Result<Option<Value>, AppError> {
        let mut table = self.write()?;
        let removed = self.position(&table, id).map(|i| table.rows.remove(i));
        if removed.is_some() {
            tracing::debug!(id = %id, "memory: deleted");
        }
        Ok(removed.map(Value::Object))
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let mut table = self.write()?;
        let n = table.rows.len() as u64;
        table.rows.clear();
        tracing::debug!(removed = n, "memory: cleared");
        Ok(n)
    }
}
