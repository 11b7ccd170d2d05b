//! Raw config types matching the JSON router description.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Integer,
    Float,
    String,
    Boolean,
    Uuid,
    Json,
}

impl FieldType {
    /// PostgreSQL type used for DDL and parameter casts.
    pub fn pg_type(&self) -> &'static str {
        match self {
            FieldType::Integer => "bigint",
            FieldType::Float => "double precision",
            FieldType::String => "text",
            FieldType::Boolean => "boolean",
            FieldType::Uuid => "uuid",
            FieldType::Json => "jsonb",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: FieldType,
    /// Value may be null and may be omitted.
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

impl FieldConfig {
    pub fn new(name: impl Into<String>, type_: FieldType) -> Self {
        FieldConfig {
            name: name.into(),
            type_,
            optional: false,
            default: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }
}

fn default_pk() -> String {
    "id".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub name: String,
    pub fields: Vec<FieldConfig>,
    #[serde(default = "default_pk")]
    pub primary_key: String,
}

impl SchemaConfig {
    pub fn new(name: impl Into<String>, fields: Vec<FieldConfig>) -> Self {
        SchemaConfig {
            name: name.into(),
            fields,
            primary_key: default_pk(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Which of the six generated routes are mounted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteToggles {
    #[serde(default = "default_true")]
    pub get_all: bool,
    #[serde(default = "default_true")]
    pub get_one: bool,
    #[serde(default = "default_true")]
    pub create: bool,
    #[serde(default = "default_true")]
    pub update: bool,
    #[serde(default = "default_true")]
    pub delete_one: bool,
    #[serde(default = "default_true")]
    pub delete_all: bool,
}

impl Default for RouteToggles {
    fn default() -> Self {
        RouteToggles {
            get_all: true,
            get_one: true,
            create: true,
            update: true,
            delete_one: true,
            delete_all: true,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouterConfig {
    pub schema: SchemaConfig,
    /// Body schema for POST. Defaults to `schema` without its primary key.
    #[serde(default)]
    pub create_schema: Option<SchemaConfig>,
    /// Body schema for PATCH. Defaults to `schema` without its primary key.
    #[serde(default)]
    pub update_schema: Option<SchemaConfig>,
    #[serde(default)]
    pub prefix: Option<String>,
    /// SQL table name for the PostgreSQL backend.
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pagination: bool,
    #[serde(default)]
    pub routes: RouteToggles,
    #[serde(default)]
    pub path_param_name: Option<String>,
    #[serde(default)]
    pub entity_name: Option<String>,
    #[serde(default)]
    pub entity_name_plural: Option<String>,
    #[serde(default)]
    pub summary_prefix: Option<String>,
    #[serde(default)]
    pub validation: HashMap<String, ValidationRule>,
}

impl RouterConfig {
    pub fn new(schema: SchemaConfig) -> Self {
        RouterConfig {
            schema,
            create_schema: None,
            update_schema: None,
            prefix: None,
            table: None,
            tags: Vec::new(),
            pagination: false,
            routes: RouteToggles::default(),
            path_param_name: None,
            entity_name: None,
            entity_name_plural: None,
            summary_prefix: None,
            validation: HashMap::new(),
        }
    }
}

/// All router configs in one struct; the shape of the JSON config file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FullConfig {
    #[serde(default)]
    pub routers: Vec<RouterConfig>,
}
