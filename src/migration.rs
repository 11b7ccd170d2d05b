//! Apply router schemas to the database: one CREATE TABLE IF NOT EXISTS per router.

use crate::config::{FieldType, ResolvedRouter};
use crate::error::AppError;
use crate::sql::{qualified_table, quoted};
use sqlx::PgPool;

/// DDL for one router's table. Integer keys get an identity, uuid keys `gen_random_uuid()`.
pub fn create_table_sql(router: &ResolvedRouter) -> String {
    let mut col_defs: Vec<String> = Vec::new();
    for f in &router.schema.fields {
        let mut def = format!("{} {}", quoted(&f.name), f.field_type.pg_type());
        if f.name == router.pk {
            match f.field_type {
                FieldType::Integer => def.push_str(" GENERATED BY DEFAULT AS IDENTITY"),
                FieldType::Uuid => def.push_str(" DEFAULT gen_random_uuid()"),
                _ => {}
            }
            def.push_str(" PRIMARY KEY");
        } else if !f.nullable {
            def.push_str(" NOT NULL");
        }
        col_defs.push(def);
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        qualified_table(&router.table_name),
        col_defs.join(", ")
    )
}

/// Create every router's table (and its schema, when the table name is qualified). Idempotent.
pub async fn apply_migrations(pool: &PgPool, routers: &[ResolvedRouter]) -> Result<(), AppError> {
    for r in routers {
        if let Some((schema, _)) = r.table_name.split_once('.') {
            sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
                .execute(pool)
                .await?;
        }
        let ddl = create_table_sql(r);
        tracing::debug!(sql = %ddl, "migration");
        sqlx::query(&ddl).execute(pool).await?;
        tracing::info!(table = %r.table_name, "table ready");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, FieldConfig, RouterConfig, SchemaConfig};

    #[test]
    fn ddl_for_integer_and_uuid_keys() {
        let potato = resolve(&RouterConfig::new(SchemaConfig::new(
            "Potato",
            vec![
                FieldConfig::new("id", FieldType::Integer),
                FieldConfig::new("color", FieldType::String),
                FieldConfig::new("type", FieldType::String).optional(),
            ],
        )))
        .unwrap();
        assert_eq!(
            create_table_sql(&potato),
            "CREATE TABLE IF NOT EXISTS \"potato\" (\"id\" bigint GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY, \"color\" text NOT NULL, \"type\" text)"
        );

        let mut cfg = RouterConfig::new(SchemaConfig::new(
            "Tag",
            vec![FieldConfig::new("id", FieldType::Uuid), FieldConfig::new("meta", FieldType::Json).optional()],
        ));
        cfg.table = Some("app.tags".into());
        let tag = resolve(&cfg).unwrap();
        assert_eq!(
            create_table_sql(&tag),
            "CREATE TABLE IF NOT EXISTS \"app\".\"tags\" (\"id\" uuid DEFAULT gen_random_uuid() PRIMARY KEY, \"meta\" jsonb)"
        );
    }
}
