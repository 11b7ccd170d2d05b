//! PostgreSQL backend: generic CRUD over one table using the safe SQL builder.

use crate::backend::{CrudBackend, ListQuery, ListResult};
use crate::config::{FieldType, ResolvedRouter};
use crate::error::AppError;
use crate::sql::{self, QueryBuf};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

pub struct PgBackend {
    pool: PgPool,
    router: Arc<ResolvedRouter>,
}

impl PgBackend {
    pub fn new(pool: PgPool, router: Arc<ResolvedRouter>) -> Self {
        Self { pool, router }
    }

    fn bind(q: &QueryBuf) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        query
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = Self::bind(q).fetch_optional(&self.pool).await.map_err(map_db_error)?;
        Ok(row.map(|r| self.row_to_json(&r)))
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = Self::bind(q).fetch_all(&self.pool).await.map_err(map_db_error)?;
        Ok(rows.iter().map(|r| self.row_to_json(r)).collect())
    }

    fn row_to_json(&self, row: &PgRow) -> Value {
        let mut map = Map::new();
        for f in &self.router.schema.fields {
            map.insert(f.name.clone(), cell_to_value(row, &f.name, f.field_type));
        }
        Value::Object(map)
    }
}

/// Integrity violations (SQLSTATE class 23) become 422 conflicts; everything else passes through.
fn map_db_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().is_some_and(|c| c.starts_with("23")) {
            tracing::debug!(error = %db, "integrity violation");
            return AppError::key_exists();
        }
    }
    AppError::Db(e)
}

fn cell_to_value(row: &PgRow, name: &str, t: FieldType) -> Value {
    match t {
        FieldType::Integer => {
            if let Ok(v) = row.try_get::<Option<i64>, _>(name) {
                return v.map(Value::from).unwrap_or(Value::Null);
            }
            if let Ok(v) = row.try_get::<Option<i32>, _>(name) {
                return v.map(Value::from).unwrap_or(Value::Null);
            }
            if let Ok(v) = row.try_get::<Option<i16>, _>(name) {
                return v.map(Value::from).unwrap_or(Value::Null);
            }
        }
        FieldType::Float => {
            if let Ok(v) = row.try_get::<Option<f64>, _>(name) {
                return v.and_then(serde_json::Number::from_f64).map(Value::Number).unwrap_or(Value::Null);
            }
            if let Ok(v) = row.try_get::<Option<f32>, _>(name) {
                return v
                    .and_then(|n| serde_json::Number::from_f64(n as f64))
                    .map(Value::Number)
                    .unwrap_or(Value::Null);
            }
        }
        FieldType::Boolean => {
            if let Ok(v) = row.try_get::<Option<bool>, _>(name) {
                return v.map(Value::Bool).unwrap_or(Value::Null);
            }
        }
        FieldType::Uuid => {
            if let Ok(v) = row.try_get::<Option<uuid::Uuid>, _>(name) {
                return v.map(|u| Value::String(u.to_string())).unwrap_or(Value::Null);
            }
        }
        FieldType::Json => {
            if let Ok(v) = row.try_get::<Option<Value>, _>(name) {
                return v.unwrap_or(Value::Null);
            }
        }
        FieldType::String => {}
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(name) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    Value::Null
}

#[async_trait]
impl CrudBackend for PgBackend {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self, query: &ListQuery) -> Result<ListResult, AppError> {
        let items = self.fetch_all(&sql::select_list(&self.router, query)).await?;
        let total = if query.window.is_some() {
            let q = sql::count(&self.router, &query.filters);
            tracing::debug!(sql = %q.sql, params = ?q.params, "query");
            let n: i64 = Self::bind(&q)
                .fetch_one(&self.pool)
                .await
                .and_then(|r| r.try_get(0))
                .map_err(map_db_error)?;
            u64::try_from(n).unwrap_or(0)
        } else {
            items.len() as u64
        };
        Ok(ListResult { items, total })
    }

    async fn get(&self, id: &Value) -> Result<Option<Value>, AppError> {
        self.fetch_optional(&sql::select_by_id(&self.router, id)).await
    }

    async fn create(&self, body: Map<String, Value>) -> Result<Value, AppError> {
        self.fetch_optional(&sql::insert(&self.router, &body))
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(&self, id: &Value, body: Map<String, Value>) -> Result<Option<Value>, AppError> {
        self.fetch_optional(&sql::update(&self.router, id, &body)).await
    }

    async fn delete_one(&self, id: &Value) -> Result<Option<Value>, AppError> {
        self.fetch_optional(&sql::delete(&self.router, id)).await
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let q = sql::delete_all(&self.router);
        tracing::debug!(sql = %q.sql, "query");
        let done = sqlx::query(&q.sql).execute(&self.pool).await.map_err(map_db_error)?;
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}
