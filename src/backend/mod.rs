//! Persistence seam: every generated route calls exactly one of these operations.

mod memory;
mod postgres;

pub use memory::MemoryBackend;
pub use postgres::PgBackend;

use crate::error::AppError;
use crate::query::{FilterSpec, SortSpec};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Offset/limit slice of the filtered, ordered record set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

#[derive(Clone, Debug, Default)]
pub struct ListQuery {
    pub filters: Vec<FilterSpec>,
    pub sort: Vec<SortSpec>,
    /// None returns every matching record.
    pub window: Option<Window>,
}

#[derive(Clone, Debug, Default)]
pub struct ListResult {
    pub items: Vec<Value>,
    /// Matching records before the window is applied.
    pub total: u64,
}

#[async_trait]
pub trait CrudBackend: Send + Sync {
    /// Short label for logs and readiness output.
    fn name(&self) -> &'static str;

    async fn list(&self, query: &ListQuery) -> Result<ListResult, AppError>;

    async fn get(&self, id: &Value) -> Result<Option<Value>, AppError>;

    /// Insert a validated body. Integrity violations surface as `AppError::Conflict`.
    async fn create(&self, body: Map<String, Value>) -> Result<Value, AppError>;

    /// Apply the fields in `body` to the record; the primary key never changes.
    async fn update(&self, id: &Value, body: Map<String, Value>) -> Result<Option<Value>, AppError>;

    /// Remove one record and return it.
    async fn delete_one(&self, id: &Value) -> Result<Option<Value>, AppError>;

    /// Remove every record and return how many were removed.
    async fn delete_all(&self) -> Result<u64, AppError>;

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
