//! Load config from a JSON file or in-memory structs and resolve it for runtime use.

use crate::case::{normalize_prefix, path_param_name, to_snake_case};
use crate::config::resolved::{FieldInfo, FieldRules, ObjectSchema, PkType, ResolvedRouter};
use crate::config::types::*;
use crate::config::{validate, validate_router};
use crate::error::ConfigError;
use std::path::Path;

/// Prefix a router will be mounted under: `prefix`, else `table`, else the schema name.
pub fn resolved_prefix(config: &RouterConfig) -> String {
    let raw = config
        .prefix
        .as_deref()
        .or(config.table.as_deref())
        .unwrap_or(&config.schema.name);
    normalize_prefix(raw)
}

fn object_schema(schema: &SchemaConfig) -> ObjectSchema {
    ObjectSchema {
        name: schema.name.clone(),
        fields: schema
            .fields
            .iter()
            .map(|f| FieldInfo {
                name: f.name.clone(),
                field_type: f.type_,
                required: !f.optional && f.default.is_none(),
                nullable: f.optional,
                default: f.default.clone(),
            })
            .collect(),
    }
}

/// Build the resolved router from one config (validates it first).
pub fn resolve(config: &RouterConfig) -> Result<ResolvedRouter, ConfigError> {
    validate_router(config)?;

    let schema = object_schema(&config.schema);
    let pk = config.schema.primary_key.clone();
    let pk_field = schema.field(&pk).ok_or_else(|| ConfigError::InvalidPrimaryKey {
        schema: schema.name.clone(),
        field: pk.clone(),
    })?;
    let pk_type = PkType::from_field_type(pk_field.field_type);

    let create_schema = config
        .create_schema
        .as_ref()
        .map(object_schema)
        .unwrap_or_else(|| schema.without_pk(&pk, "Create"));
    let update_schema = config
        .update_schema
        .as_ref()
        .map(object_schema)
        .unwrap_or_else(|| schema.without_pk(&pk, "Update"));

    let entity_name = config.entity_name.clone().unwrap_or_else(|| "Item".into());
    let entity_name_plural = config
        .entity_name_plural
        .clone()
        .unwrap_or_else(|| format!("{}s", entity_name));
    let param = config
        .path_param_name
        .clone()
        .unwrap_or_else(|| path_param_name(&entity_name));
    let summary_prefix = config
        .summary_prefix
        .as_deref()
        .map(|p| format!("{} ", p))
        .unwrap_or_default();
    let table_name = config
        .table
        .clone()
        .unwrap_or_else(|| to_snake_case(&config.schema.name));

    Ok(ResolvedRouter {
        prefix: resolved_prefix(config),
        schema,
        create_schema,
        update_schema,
        pk,
        pk_type,
        table_name,
        tags: config.tags.clone(),
        pagination: config.pagination,
        routes: config.routes.clone(),
        path_param_name: param,
        entity_name,
        entity_name_plural,
        summary_prefix,
        validation: FieldRules::compile(&config.validation)?,
    })
}

/// Validate the whole config (including prefix uniqueness) and resolve every router.
pub fn resolve_all(config: &FullConfig) -> Result<Vec<ResolvedRouter>, ConfigError> {
    validate(config)?;
    config.routers.iter().map(resolve).collect()
}

/// Load the full config from a JSON file.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<FullConfig, ConfigError> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "loading router config");
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn potato_config() -> RouterConfig {
        RouterConfig::new(SchemaConfig::new(
            "Potato",
            vec![
                FieldConfig::new("id", FieldType::Integer),
                FieldConfig::new("thickness", FieldType::Float),
                FieldConfig::new("color", FieldType::String),
                FieldConfig::new("type", FieldType::String).optional(),
            ],
        ))
    }

    #[test]
    fn defaults_follow_schema_name() {
        let r = resolve(&potato_config()).unwrap();
        assert_eq!(r.prefix, "/potato");
        assert_eq!(r.table_name, "potato");
        assert_eq!(r.entity_name, "Item");
        assert_eq!(r.entity_name_plural, "Items");
        assert_eq!(r.path_param_name, "item_id");
        assert_eq!(r.summary_prefix, "");
        assert_eq!(r.pk_type, PkType::Int);
        assert_eq!(r.collection_path(), "/potato/");
        assert_eq!(r.item_path_template(), "/potato/{item_id}/");
    }

    #[test]
    fn derived_bodies_drop_the_primary_key() {
        let r = resolve(&potato_config()).unwrap();
        assert_eq!(r.create_schema.name, "PotatoCreate");
        assert_eq!(r.update_schema.name, "PotatoUpdate");
        assert!(r.create_schema.field("id").is_none());
        assert!(r.update_schema.field("color").unwrap().required);
        assert!(!r.create_schema.field("type").unwrap().required);
    }

    #[test]
    fn explicit_names_win() {
        let mut cfg = potato_config();
        cfg.prefix = Some("/Tubers/".into());
        cfg.entity_name = Some("Garden Potato".into());
        cfg.summary_prefix = Some("Admin".into());
        cfg.table = Some("potatoes".into());
        let r = resolve(&cfg).unwrap();
        assert_eq!(r.prefix, "/tubers");
        assert_eq!(r.table_name, "potatoes");
        assert_eq!(r.entity_name_plural, "Garden Potatos");
        assert_eq!(r.path_param_name, "garden_potato_id");
        assert_eq!(r.summary_prefix, "Admin ");
    }

    #[test]
    fn table_name_is_the_prefix_fallback() {
        let mut cfg = potato_config();
        cfg.table = Some("spuds".into());
        assert_eq!(resolved_prefix(&cfg), "/spuds");
    }

    #[tokio::test]
    async fn load_from_missing_path_is_a_load_error() {
        let err = load_from_path("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
