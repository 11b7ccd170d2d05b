//! List filtering and sorting: JSON specs from the `filter` and `sort` query params,
//! plus in-memory evaluation used by the memory backend.

use crate::config::{FieldType, ObjectSchema};
use crate::error::AppError;
use crate::service::coerce;
use regex::RegexBuilder;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "==", alias = "eq")]
    Eq,
    #[serde(rename = "!=", alias = "ne")]
    Ne,
    #[serde(rename = ">", alias = "gt")]
    Gt,
    #[serde(rename = ">=", alias = "ge")]
    Ge,
    #[serde(rename = "<", alias = "lt")]
    Lt,
    #[serde(rename = "<=", alias = "le")]
    Le,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "ilike")]
    ILike,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not_in")]
    NotIn,
    #[serde(rename = "is_null")]
    IsNull,
    #[serde(rename = "is_not_null")]
    IsNotNull,
}

fn default_op() -> FilterOp {
    FilterOp::Eq
}

#[derive(Clone, Debug, Deserialize)]
pub struct FilterSpec {
    pub field: String,
    #[serde(default = "default_op")]
    pub op: FilterOp,
    #[serde(default)]
    pub value: Value,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(v: OneOrMany<T>) -> Self {
        match v {
            OneOrMany::One(t) => vec![t],
            OneOrMany::Many(v) => v,
        }
    }
}

fn parse_spec<T: for<'de> Deserialize<'de>>(param: &str, raw: Option<&str>) -> Result<Vec<T>, AppError> {
    match raw {
        None => Ok(Vec::new()),
        Some(s) if s.trim().is_empty() => Ok(Vec::new()),
        Some(s) => serde_json::from_str::<OneOrMany<T>>(s)
            .map(Into::into)
            .map_err(|e| AppError::invalid("query", param, format!("invalid {} spec: {}", param, e), "value_error.json")),
    }
}

/// Parse the `filter` param and check every spec against the entity schema.
/// Comparison values are coerced to the column type, so uuids come back normalized.
pub fn parse_filters(raw: Option<&str>, schema: &ObjectSchema) -> Result<Vec<FilterSpec>, AppError> {
    let mut filters: Vec<FilterSpec> = parse_spec("filter", raw)?;
    for f in &mut filters {
        let Some(field) = schema.field(&f.field) else {
            return Err(AppError::invalid("query", "filter", format!("unknown field '{}'", f.field), "value_error"));
        };
        match f.op {
            FilterOp::In | FilterOp::NotIn => {
                let Value::Array(items) = std::mem::take(&mut f.value) else {
                    return Err(AppError::invalid(
                        "query",
                        "filter",
                        format!("'{}' filter on '{}' needs an array value", if f.op == FilterOp::In { "in" } else { "not_in" }, f.field),
                        "value_error",
                    ));
                };
                let items = items
                    .into_iter()
                    .map(|v| typed_value(&f.field, v, field.field_type))
                    .collect::<Result<Vec<_>, _>>()?;
                f.value = Value::Array(items);
            }
            FilterOp::Like | FilterOp::ILike => {
                if !f.value.is_string() {
                    return Err(AppError::invalid(
                        "query",
                        "filter",
                        format!("like filter on '{}' needs a string pattern", f.field),
                        "value_error",
                    ));
                }
            }
            FilterOp::IsNull | FilterOp::IsNotNull => {}
            _ => {
                let v = std::mem::take(&mut f.value);
                f.value = typed_value(&f.field, v, field.field_type)?;
            }
        }
    }
    Ok(filters)
}

fn typed_value(field: &str, v: Value, t: FieldType) -> Result<Value, AppError> {
    if v.is_null() {
        return Ok(v);
    }
    coerce(v, t).map_err(|(msg, kind)| {
        AppError::invalid("query", "filter", format!("filter value for '{}': {}", field, msg), kind)
    })
}

/// Parse the `sort` param and check every spec against the entity schema.
pub fn parse_sort(raw: Option<&str>, schema: &ObjectSchema) -> Result<Vec<SortSpec>, AppError> {
    let sort: Vec<SortSpec> = parse_spec("sort", raw)?;
    if let Some(s) = sort.iter().find(|s| schema.field(&s.field).is_none()) {
        return Err(AppError::invalid("query", "sort", format!("unknown field '{}'", s.field), "value_error"));
    }
    Ok(sort)
}

/// Total order over JSON scalars: null < bool < number < string; other kinds compare equal.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i.cmp(&j),
            _ => x
                .as_f64()
                .unwrap_or(0.0)
                .partial_cmp(&y.as_f64().unwrap_or(0.0))
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Ordering::Equal,
        _ => a == b,
    }
}

/// SQL LIKE semantics: `%` any run, `_` one char, everything else literal.
pub fn like_matches(pattern: &str, text: &str, case_insensitive: bool) -> bool {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    let mut buf = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            other => re.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    re.push('$');
    RegexBuilder::new(&re)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .map(|r| r.is_match(text))
        .unwrap_or(false)
}

impl FilterSpec {
    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        let v = record.get(&self.field).unwrap_or(&Value::Null);
        match self.op {
            FilterOp::IsNull => v.is_null(),
            FilterOp::IsNotNull => !v.is_null(),
            FilterOp::Eq => scalar_eq(v, &self.value),
            FilterOp::Ne => !scalar_eq(v, &self.value),
            // Ordered comparisons never match null, like SQL.
            _ if v.is_null() => false,
            FilterOp::Gt => compare_values(v, &self.value) == Ordering::Greater,
            FilterOp::Ge => compare_values(v, &self.value) != Ordering::Less,
            FilterOp::Lt => compare_values(v, &self.value) == Ordering::Less,
            FilterOp::Le => compare_values(v, &self.value) != Ordering::Greater,
            FilterOp::Like | FilterOp::ILike => match (v.as_str(), self.value.as_str()) {
                (Some(text), Some(pattern)) => like_matches(pattern, text, self.op == FilterOp::ILike),
                _ => false,
            },
            FilterOp::In => self
                .value
                .as_array()
                .is_some_and(|vals| vals.iter().any(|x| scalar_eq(v, x))),
            FilterOp::NotIn => self
                .value
                .as_array()
                .is_some_and(|vals| !vals.iter().any(|x| scalar_eq(v, x))),
        }
    }
}

/// Order records by the sort specs, falling back to `pk` ascending for ties.
pub fn sort_records(records: &mut [Map<String, Value>], sort: &[SortSpec], pk: &str) {
    records.sort_by(|a, b| {
        for s in sort {
            let ord = compare_values(
                a.get(&s.field).unwrap_or(&Value::Null),
                b.get(&s.field).unwrap_or(&Value::Null),
            );
            let ord = match s.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        compare_values(a.get(pk).unwrap_or(&Value::Null), b.get(pk).unwrap_or(&Value::Null))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldInfo, FieldType};
    use serde_json::json;

    fn schema() -> ObjectSchema {
        let f = |name: &str, t| FieldInfo {
            name: name.into(),
            field_type: t,
            required: true,
            nullable: true,
            default: None,
        };
        ObjectSchema {
            name: "Potato".into(),
            fields: vec![f("id", FieldType::Integer), f("color", FieldType::String), f("mass", FieldType::Float)],
        }
    }

    fn rec(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn parses_single_and_list_specs() {
        let one = parse_filters(Some(r#"{"field":"color","value":"Brown"}"#), &schema()).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].op, FilterOp::Eq);
        let many = parse_filters(
            Some(r#"[{"field":"mass","op":">=","value":1},{"field":"color","op":"ilike","value":"b%"}]"#),
            &schema(),
        )
        .unwrap();
        assert_eq!(many[1].op, FilterOp::ILike);
        let sort = parse_sort(Some(r#"{"field":"mass","direction":"desc"}"#), &schema()).unwrap();
        assert_eq!(sort[0].direction, SortDirection::Desc);
        assert!(parse_filters(None, &schema()).unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_specs() {
        assert!(parse_filters(Some("{not json"), &schema()).is_err());
        assert!(parse_filters(Some(r#"{"field":"weight","value":1}"#), &schema()).is_err());
        assert!(parse_filters(Some(r#"{"field":"mass","op":"in","value":1}"#), &schema()).is_err());
        assert!(parse_filters(Some(r#"{"field":"mass","op":"~","value":1}"#), &schema()).is_err());
        assert!(parse_sort(Some(r#"{"field":"weight"}"#), &schema()).is_err());
    }

    #[test]
    fn filter_values_must_fit_the_column_type() {
        let err = parse_filters(Some(r#"{"field":"mass","op":">","value":"abc"}"#), &schema()).unwrap_err();
        let AppError::Invalid(errors) = err else { panic!("expected field errors") };
        assert_eq!(errors[0].loc, vec!["query".to_string(), "filter".to_string()]);
        assert_eq!(errors[0].kind, "type_error.float");

        assert!(parse_filters(Some(r#"{"field":"mass","op":"in","value":[1,"x"]}"#), &schema()).is_err());
        assert!(parse_filters(Some(r#"{"field":"id","op":"not_in","value":[1.5]}"#), &schema()).is_err());
        assert!(parse_filters(Some(r#"{"field":"color","value":3}"#), &schema()).is_err());

        let ok = parse_filters(
            Some(r#"[{"field":"color","op":"==","value":null},{"field":"mass","op":"in","value":[1,2.5,null]},{"field":"id","op":"is_null","value":"ignored"}]"#),
            &schema(),
        )
        .unwrap();
        assert_eq!(ok[1].value, json!([1, 2.5, null]));
    }

    #[test]
    fn filter_ops_match_like_sql() {
        let r = rec(json!({ "id": 1, "color": "Brown", "mass": 1.5 }));
        let f = |field: &str, op, value| FilterSpec { field: field.into(), op, value };
        assert!(f("mass", FilterOp::Eq, json!(1.5)).matches(&r));
        assert!(f("id", FilterOp::Eq, json!(1.0)).matches(&r));
        assert!(f("mass", FilterOp::Gt, json!(1)).matches(&r));
        assert!(!f("mass", FilterOp::Lt, json!(1)).matches(&r));
        assert!(f("color", FilterOp::Like, json!("Br%")).matches(&r));
        assert!(!f("color", FilterOp::Like, json!("br%")).matches(&r));
        assert!(f("color", FilterOp::ILike, json!("br_wn")).matches(&r));
        assert!(f("color", FilterOp::In, json!(["Red", "Brown"])).matches(&r));
        assert!(f("color", FilterOp::NotIn, json!(["Red"])).matches(&r));
        assert!(f("missing", FilterOp::IsNull, Value::Null).matches(&r));
        assert!(!f("missing", FilterOp::Gt, json!(0)).matches(&r));
    }

    #[test]
    fn like_escapes_regex_metacharacters() {
        assert!(like_matches("a.b%", "a.bc", false));
        assert!(!like_matches("a.b%", "axbc", false));
    }

    #[test]
    fn sorts_by_specs_then_pk() {
        let mut rows = vec![
            rec(json!({ "id": 3, "mass": 1.0 })),
            rec(json!({ "id": 1, "mass": 2.0 })),
            rec(json!({ "id": 2, "mass": 1.0 })),
        ];
        sort_records(&mut rows, &[SortSpec { field: "mass".into(), direction: SortDirection::Desc }], "id");
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
