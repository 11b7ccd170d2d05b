//! Config validation: schema integrity and route consistency.

use crate::config::{resolved_prefix, FieldRules, FieldType, FullConfig, RouterConfig, SchemaConfig};
use crate::error::ConfigError;
use std::collections::HashSet;

/// Paths served by the app itself; a router prefix may not take them.
pub const RESERVED_PATHS: [&str; 5] = ["/health", "/ready", "/version", "/info", "/openapi.json"];

fn validate_schema(schema: &SchemaConfig, require_pk: bool) -> Result<(), ConfigError> {
    if schema.name.trim().is_empty() {
        return Err(ConfigError::Validation("schema name must not be empty".into()));
    }
    let mut names = HashSet::new();
    for f in &schema.fields {
        if !names.insert(f.name.as_str()) {
            return Err(ConfigError::DuplicateField {
                schema: schema.name.clone(),
                field: f.name.clone(),
            });
        }
    }
    if require_pk {
        let pk = schema
            .fields
            .iter()
            .find(|f| f.name == schema.primary_key)
            .ok_or_else(|| ConfigError::InvalidPrimaryKey {
                schema: schema.name.clone(),
                field: schema.primary_key.clone(),
            })?;
        if matches!(pk.type_, FieldType::Json | FieldType::Boolean | FieldType::Float) || pk.optional {
            return Err(ConfigError::InvalidPrimaryKey {
                schema: schema.name.clone(),
                field: schema.primary_key.clone(),
            });
        }
    }
    Ok(())
}

pub fn validate_router(config: &RouterConfig) -> Result<(), ConfigError> {
    validate_schema(&config.schema, true)?;
    if let Some(s) = &config.create_schema {
        validate_schema(s, false)?;
    }
    if let Some(s) = &config.update_schema {
        validate_schema(s, false)?;
    }
    for field in config.validation.keys() {
        if !config.schema.fields.iter().any(|f| &f.name == field) {
            return Err(ConfigError::MissingReference {
                kind: "validation field",
                id: field.clone(),
            });
        }
    }
    FieldRules::compile(&config.validation)?;
    let prefix = resolved_prefix(config);
    if prefix == "/" {
        return Err(ConfigError::Validation(format!(
            "router for '{}' resolves to an empty prefix",
            config.schema.name
        )));
    }
    if RESERVED_PATHS.contains(&prefix.as_str()) {
        return Err(ConfigError::Validation(format!(
            "router for '{}' resolves to reserved path '{}'",
            config.schema.name, prefix
        )));
    }
    if let Some(name) = &config.path_param_name {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::Validation(format!("invalid path parameter name '{}'", name)));
        }
    }
    Ok(())
}

pub fn validate(config: &FullConfig) -> Result<(), ConfigError> {
    let mut prefixes = HashSet::new();
    for r in &config.routers {
        validate_router(r)?;
        let prefix = resolved_prefix(r);
        if !prefixes.insert(prefix.clone()) {
            return Err(ConfigError::DuplicatePrefix(prefix));
        }
    }
    Ok(())
}
