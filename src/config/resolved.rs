//! Resolved router model: config validated and flattened for runtime use.

use crate::config::{FieldType, RouteToggles, ValidationRule};
use crate::error::ConfigError;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// Primary key type for parsing path ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PkType {
    Uuid,
    Int,
    Text,
}

impl PkType {
    pub fn from_field_type(t: FieldType) -> Self {
        match t {
            FieldType::Integer => PkType::Int,
            FieldType::Uuid => PkType::Uuid,
            _ => PkType::Text,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub name: String,
    pub field_type: FieldType,
    /// Must be present in request bodies.
    pub required: bool,
    /// Accepts JSON null.
    pub nullable: bool,
    /// Filled in when the field is omitted.
    pub default: Option<Value>,
}

/// A named object shape: the entity itself, or one of its request bodies.
#[derive(Clone, Debug)]
pub struct ObjectSchema {
    pub name: String,
    pub fields: Vec<FieldInfo>,
}

impl ObjectSchema {
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Copy of this schema without `pk`, named `<name><suffix>`. Used for the default create and update bodies.
    pub fn without_pk(&self, pk: &str, suffix: &str) -> ObjectSchema {
        ObjectSchema {
            name: format!("{}{}", self.name, suffix),
            fields: self.fields.iter().filter(|f| f.name != pk).cloned().collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedRouter {
    pub schema: ObjectSchema,
    pub create_schema: ObjectSchema,
    pub update_schema: ObjectSchema,
    pub pk: String,
    pub pk_type: PkType,
    /// Always starts with '/', never ends with one.
    pub prefix: String,
    pub table_name: String,
    pub tags: Vec<String>,
    pub pagination: bool,
    pub routes: RouteToggles,
    pub path_param_name: String,
    pub entity_name: String,
    pub entity_name_plural: String,
    /// Empty, or the configured prefix followed by one space.
    pub summary_prefix: String,
    pub validation: FieldRules,
}

/// Per-field validation rules with their patterns compiled once at resolve time.
#[derive(Clone, Debug, Default)]
pub struct FieldRules {
    rules: HashMap<String, ValidationRule>,
    patterns: HashMap<String, Regex>,
}

impl FieldRules {
    pub fn compile(rules: &HashMap<String, ValidationRule>) -> Result<Self, ConfigError> {
        let mut patterns = HashMap::new();
        for (field, rule) in rules {
            if let Some(p) = &rule.pattern {
                let re = Regex::new(p).map_err(|e| {
                    ConfigError::Validation(format!("invalid pattern for '{}': {}", field, e))
                })?;
                patterns.insert(field.clone(), re);
            }
        }
        Ok(Self {
            rules: rules.clone(),
            patterns,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ValidationRule)> {
        self.rules.iter()
    }

    pub fn pattern(&self, field: &str) -> Option<&Regex> {
        self.patterns.get(field)
    }
}

impl ResolvedRouter {
    pub fn collection_path(&self) -> String {
        format!("{}/", self.prefix)
    }

    /// Item path in OpenAPI template syntax, e.g. `/potato/{item_id}/`.
    pub fn item_path_template(&self) -> String {
        format!("{}/{{{}}}/", self.prefix, self.path_param_name)
    }

    /// Tags for docs: the configured ones, else the prefix without its slash.
    pub fn doc_tags(&self) -> Vec<String> {
        if self.tags.is_empty() {
            vec![self.prefix.trim_start_matches('/').to_string()]
        } else {
            self.tags.clone()
        }
    }
}
