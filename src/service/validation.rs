//! Request validation: body shape from the object schema, then config rules.

use crate::config::{FieldRules, FieldType, ObjectSchema, ValidationRule};
use crate::error::{AppError, FieldError};
use regex::Regex;
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Check `body` against `schema` and return the cleaned object: unknown keys dropped,
    /// omitted defaults filled, uuids normalized. All field errors are reported together.
    pub fn validate_body(
        body: Value,
        schema: &ObjectSchema,
        rules: &FieldRules,
    ) -> Result<Map<String, Value>, AppError> {
        Self::check_body(body, schema, rules, true)
    }

    /// Like `validate_body`, but omitted optional fields stay omitted so the update
    /// leaves them unchanged.
    pub fn validate_update(
        body: Value,
        schema: &ObjectSchema,
        rules: &FieldRules,
    ) -> Result<Map<String, Value>, AppError> {
        Self::check_body(body, schema, rules, false)
    }

    fn check_body(
        body: Value,
        schema: &ObjectSchema,
        rules: &FieldRules,
        fill_missing: bool,
    ) -> Result<Map<String, Value>, AppError> {
        let Value::Object(mut input) = body else {
            return Err(AppError::invalid("body", "__root__", "value is not a valid dict", "type_error.dict"));
        };
        let mut out = Map::new();
        let mut errors = Vec::new();
        for field in &schema.fields {
            match input.remove(&field.name) {
                Some(Value::Null) if field.nullable => {
                    out.insert(field.name.clone(), Value::Null);
                }
                Some(Value::Null) => errors.push(FieldError::new(
                    "body",
                    &field.name,
                    "none is not an allowed value",
                    "type_error.none.not_allowed",
                )),
                Some(v) => match coerce(v, field.field_type) {
                    Ok(v) => {
                        out.insert(field.name.clone(), v);
                    }
                    Err((msg, kind)) => errors.push(FieldError::new("body", &field.name, msg, kind)),
                },
                None if field.required => {
                    errors.push(FieldError::new("body", &field.name, "field required", "value_error.missing"));
                }
                None if fill_missing => {
                    out.insert(field.name.clone(), field.default.clone().unwrap_or(Value::Null));
                }
                None => {}
            }
        }
        if !errors.is_empty() {
            return Err(AppError::Invalid(errors));
        }
        Self::validate(&out, rules)?;
        Ok(out)
    }

    /// Validate a body against per-field rules. Fields marked required must be present.
    pub fn validate(body: &Map<String, Value>, rules: &FieldRules) -> Result<(), AppError> {
        for (col, rule) in rules.iter() {
            let val = body.get(col);
            if rule.required == Some(true) && (val.is_none() || val == Some(&Value::Null)) {
                return Err(AppError::Validation(format!("{} is required", col)));
            }
            if let Some(v) = val {
                validate_field(col, v, rule, rules.pattern(col))?;
            }
        }
        Ok(())
    }
}

pub(crate) fn coerce(v: Value, t: FieldType) -> Result<Value, (&'static str, &'static str)> {
    match t {
        FieldType::Integer => match &v {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(v),
            _ => Err(("value is not a valid integer", "type_error.integer")),
        },
        FieldType::Float => match &v {
            Value::Number(_) => Ok(v),
            _ => Err(("value is not a valid float", "type_error.float")),
        },
        FieldType::String => match &v {
            Value::String(_) => Ok(v),
            _ => Err(("str type expected", "type_error.str")),
        },
        FieldType::Boolean => match &v {
            Value::Bool(_) => Ok(v),
            _ => Err(("value could not be parsed to a boolean", "type_error.bool")),
        },
        FieldType::Uuid => v
            .as_str()
            .and_then(|s| uuid::Uuid::parse_str(s).ok())
            .map(|u| Value::String(u.to_string()))
            .ok_or(("value is not a valid uuid", "type_error.uuid")),
        FieldType::Json => Ok(v),
    }
}

fn validate_field(col: &str, v: &Value, rule: &ValidationRule, pattern: Option<&Regex>) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    if let Some(format) = &rule.format {
        validate_format(col, v, format)?;
    }
    if let Some(max) = rule.max_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() > max as usize {
                return Err(AppError::Validation(format!("{} must be at most {} characters", col, max)));
            }
        }
    }
    if let Some(min) = rule.min_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() < min as usize {
                return Err(AppError::Validation(format!("{} must be at least {} characters", col, min)));
            }
        }
    }
    if let Some(re) = pattern {
        if let Some(s) = v.as_str() {
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", col)));
            }
        }
    }
    if let Some(ref allowed) = rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(AppError::Validation(format!(
                "{} must be one of: {:?}",
                col,
                allowed.iter().take(5).collect::<Vec<_>>()
            )));
        }
    }
    if let Some(min) = rule.minimum {
        if let Some(n) = v.as_f64() {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", col, min)));
            }
        }
    }
    if let Some(max) = rule.maximum {
        if let Some(n) = v.as_f64() {
            if n > max {
                return Err(AppError::Validation(format!("{} must be at most {}", col, max)));
            }
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn validate_format(col: &str, v: &Value, format: &str) -> Result<(), AppError> {
    match format.to_lowercase().as_str() {
        "email" => {
            if let Some(s) = v.as_str() {
                if !s.contains('@') || s.len() < 3 {
                    return Err(AppError::Validation(format!("{} must be a valid email", col)));
                }
            }
        }
        "uuid" => {
            if let Some(s) = v.as_str() {
                if uuid::Uuid::parse_str(s).is_err() {
                    return Err(AppError::Validation(format!("{} must be a valid UUID", col)));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldInfo;
    use serde_json::json;
    use std::collections::HashMap;

    fn field(name: &str, t: FieldType, required: bool, nullable: bool) -> FieldInfo {
        FieldInfo {
            name: name.into(),
            field_type: t,
            required,
            nullable,
            default: None,
        }
    }

    fn potato_body() -> ObjectSchema {
        ObjectSchema {
            name: "PotatoCreate".into(),
            fields: vec![
                field("thickness", FieldType::Float, true, false),
                field("mass", FieldType::Float, true, false),
                field("color", FieldType::String, true, false),
                field("type", FieldType::String, false, true),
            ],
        }
    }

    #[test]
    fn cleans_and_fills_body() {
        let body = json!({ "thickness": 1, "mass": 1.2, "color": "Brown", "id": 99, "extra": true });
        let out = RequestValidator::validate_body(body, &potato_body(), &FieldRules::default()).unwrap();
        assert_eq!(out.get("thickness"), Some(&json!(1)));
        assert_eq!(out.get("type"), Some(&Value::Null));
        assert!(out.get("id").is_none());
        assert!(out.get("extra").is_none());
    }

    #[test]
    fn update_leaves_omitted_optionals_out() {
        let body = json!({ "thickness": 2, "mass": 1.0, "color": "Red" });
        let out = RequestValidator::validate_update(body, &potato_body(), &FieldRules::default()).unwrap();
        assert!(!out.contains_key("type"));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn collects_every_field_error() {
        let body = json!({ "thickness": "thick", "color": null });
        let err = RequestValidator::validate_body(body, &potato_body(), &FieldRules::default()).unwrap_err();
        let AppError::Invalid(errors) = err else { panic!("expected field errors") };
        let fields: Vec<_> = errors.iter().map(|e| e.loc[1].as_str()).collect();
        assert_eq!(fields, vec!["thickness", "mass", "color"]);
        assert_eq!(errors[1].kind, "value_error.missing");
    }

    #[test]
    fn rejects_non_object_body() {
        let err = RequestValidator::validate_body(json!([1, 2]), &potato_body(), &FieldRules::default()).unwrap_err();
        assert!(matches!(err, AppError::Invalid(_)));
    }

    #[test]
    fn integer_rejects_fractions_and_uuid_is_normalized() {
        let schema = ObjectSchema {
            name: "T".into(),
            fields: vec![field("n", FieldType::Integer, true, false), field("u", FieldType::Uuid, true, false)],
        };
        let bad = RequestValidator::validate_body(json!({ "n": 1.5, "u": "x" }), &schema, &FieldRules::default());
        assert!(matches!(bad, Err(AppError::Invalid(e)) if e.len() == 2));
        let ok = RequestValidator::validate_body(
            json!({ "n": 3, "u": "67E55044-10B1-426F-9247-BB680E5FE0C8" }),
            &schema,
            &FieldRules::default(),
        )
        .unwrap();
        assert_eq!(ok["u"], json!("67e55044-10b1-426f-9247-bb680e5fe0c8"));
    }

    #[test]
    fn config_rules_apply_after_shape() {
        let mut rules = HashMap::new();
        rules.insert(
            "color".to_string(),
            ValidationRule {
                allowed: Some(vec![json!("Brown"), json!("Red")]),
                ..Default::default()
            },
        );
        let body = json!({ "thickness": 0.2, "mass": 1.0, "color": "Blue" });
        let rules = FieldRules::compile(&rules).unwrap();
        let err = RequestValidator::validate_body(body, &potato_body(), &rules).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn length_and_range_rules() {
        let mut rules = HashMap::new();
        rules.insert(
            "color".to_string(),
            ValidationRule {
                max_length: Some(3),
                ..Default::default()
            },
        );
        rules.insert(
            "mass".to_string(),
            ValidationRule {
                minimum: Some(0.0),
                ..Default::default()
            },
        );
        let rules = FieldRules::compile(&rules).unwrap();
        let mut body = Map::new();
        body.insert("color".into(), json!("Red"));
        body.insert("mass".into(), json!(2));
        RequestValidator::validate(&body, &rules).unwrap();
        body.insert("mass".into(), json!(-1));
        assert!(RequestValidator::validate(&body, &rules).is_err());
    }

    #[test]
    fn pattern_rule_uses_compiled_regex() {
        let mut rules = HashMap::new();
        rules.insert(
            "color".to_string(),
            ValidationRule {
                pattern: Some("^[A-Z][a-z]+$".into()),
                ..Default::default()
            },
        );
        let rules = FieldRules::compile(&rules).unwrap();
        let mut body = Map::new();
        body.insert("color".into(), json!("Brown"));
        RequestValidator::validate(&body, &rules).unwrap();
        body.insert("color".into(), json!("brown"));
        assert!(matches!(RequestValidator::validate(&body, &rules), Err(AppError::Validation(_))));
    }
}
