//! Builds parameterized SELECT, COUNT, INSERT, UPDATE and DELETE from a resolved router.

use crate::backend::ListQuery;
use crate::config::{FieldType, ResolvedRouter};
use crate::query::{FilterOp, FilterSpec, SortDirection};
use crate::sql::PgBindValue;
use serde_json::{Map, Value};

/// Quote identifier for PostgreSQL (safe: only from config).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Table name, schema-qualified when it contains a dot (`inventory.potato`).
pub fn qualified_table(table: &str) -> String {
    match table.split_once('.') {
        Some((schema, name)) => format!("{}.{}", quoted(schema), quoted(name)),
        None => quoted(table),
    }
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Bind `v` as a value of type `t` and return its cast placeholder, e.g. `$2::bigint`.
    fn push_param(&mut self, v: &Value, t: FieldType) -> String {
        self.params.push(PgBindValue::for_field(v, t));
        format!("${}::{}", self.params.len(), t.pg_type())
    }
}

fn select_column_list(router: &ResolvedRouter) -> String {
    router
        .schema
        .fields
        .iter()
        .map(|f| quoted(&f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn field_type(router: &ResolvedRouter, name: &str) -> FieldType {
    router
        .schema
        .field(name)
        .map(|f| f.field_type)
        .unwrap_or(FieldType::String)
}

fn filter_condition(q: &mut QueryBuf, router: &ResolvedRouter, f: &FilterSpec) -> String {
    let col = quoted(&f.field);
    let t = field_type(router, &f.field);
    let cmp = |q: &mut QueryBuf, op: &str| format!("{} {} {}", col, op, q.push_param(&f.value, t));
    match f.op {
        FilterOp::IsNull => format!("{} IS NULL", col),
        FilterOp::IsNotNull => format!("{} IS NOT NULL", col),
        FilterOp::Eq if f.value.is_null() => format!("{} IS NULL", col),
        FilterOp::Eq => cmp(q, "="),
        FilterOp::Ne => cmp(q, "IS DISTINCT FROM"),
        FilterOp::Gt => cmp(q, ">"),
        FilterOp::Ge => cmp(q, ">="),
        FilterOp::Lt => cmp(q, "<"),
        FilterOp::Le => cmp(q, "<="),
        FilterOp::Like | FilterOp::ILike => {
            let op = if f.op == FilterOp::Like { "LIKE" } else { "ILIKE" };
            let ph = q.push_param(&f.value, FieldType::String);
            format!("{}::text {} {}", col, op, ph)
        }
        FilterOp::In | FilterOp::NotIn => {
            let values = f.value.as_array().map(Vec::as_slice).unwrap_or(&[]);
            let negate = f.op == FilterOp::NotIn;
            if values.is_empty() {
                return if negate { "TRUE".into() } else { "FALSE".into() };
            }
            let placeholders: Vec<String> = values.iter().map(|v| q.push_param(v, t)).collect();
            if negate {
                format!("({} IS NULL OR {} NOT IN ({}))", col, col, placeholders.join(", "))
            } else {
                format!("{} IN ({})", col, placeholders.join(", "))
            }
        }
    }
}

fn where_clause(q: &mut QueryBuf, router: &ResolvedRouter, filters: &[FilterSpec]) -> String {
    let parts: Vec<String> = filters
        .iter()
        .filter(|f| router.schema.field(&f.field).is_some())
        .map(|f| filter_condition(q, router, f))
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// SELECT list: filters ANDed, ORDER BY the sort specs then the primary key, optional LIMIT/OFFSET.
pub fn select_list(router: &ResolvedRouter, query: &ListQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(&router.table_name);
    let where_sql = where_clause(&mut q, router, &query.filters);

    let mut order: Vec<String> = query
        .sort
        .iter()
        .filter(|s| router.schema.field(&s.field).is_some())
        .map(|s| match s.direction {
            SortDirection::Asc => format!("{} ASC NULLS FIRST", quoted(&s.field)),
            SortDirection::Desc => format!("{} DESC NULLS LAST", quoted(&s.field)),
        })
        .collect();
    order.push(format!("{} ASC", quoted(&router.pk)));

    let window = query
        .window
        .map(|w| format!(" LIMIT {} OFFSET {}", w.limit, w.offset))
        .unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}{}",
        select_column_list(router),
        table,
        where_sql,
        order.join(", "),
        window
    );
    q
}

/// SELECT COUNT(*) with the same filters as `select_list`.
pub fn count(router: &ResolvedRouter, filters: &[FilterSpec]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(&router.table_name);
    let where_sql = where_clause(&mut q, router, filters);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", table, where_sql);
    q
}

/// SELECT by primary key.
pub fn select_by_id(router: &ResolvedRouter, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(&router.table_name);
    let ph = q.push_param(id, field_type(router, &router.pk));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(router),
        table,
        quoted(&router.pk),
        ph
    );
    q
}

/// INSERT the body's entity columns. An absent primary key is left to the column default.
pub fn insert(router: &ResolvedRouter, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(&router.table_name);
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for f in &router.schema.fields {
        let Some(v) = body.get(&f.name) else { continue };
        if f.name == router.pk && v.is_null() {
            continue;
        }
        placeholders.push(q.push_param(v, f.field_type));
        cols.push(quoted(&f.name));
    }
    let returning = select_column_list(router);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by id: SET only entity columns present in body; the primary key is never set.
/// With nothing to set this degrades to a SELECT by id.
pub fn update(router: &ResolvedRouter, id: &Value, body: &Map<String, Value>) -> QueryBuf {
    let mut sets = Vec::new();
    let mut q = QueryBuf::new();
    for f in &router.schema.fields {
        if f.name == router.pk {
            continue;
        }
        if let Some(v) = body.get(&f.name) {
            let ph = q.push_param(v, f.field_type);
            sets.push(format!("{} = {}", quoted(&f.name), ph));
        }
    }
    if sets.is_empty() {
        return select_by_id(router, id);
    }
    let table = qualified_table(&router.table_name);
    let id_ph = q.push_param(id, field_type(router, &router.pk));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        table,
        sets.join(", "),
        quoted(&router.pk),
        id_ph,
        select_column_list(router)
    );
    q
}

/// DELETE by id, returning the removed row.
pub fn delete(router: &ResolvedRouter, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(&router.table_name);
    let ph = q.push_param(id, field_type(router, &router.pk));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        table,
        quoted(&router.pk),
        ph,
        select_column_list(router)
    );
    q
}

pub fn delete_all(router: &ResolvedRouter) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("DELETE FROM {}", qualified_table(&router.table_name));
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Window;
    use crate::config::{resolve, FieldConfig, RouterConfig, SchemaConfig};
    use crate::query::SortSpec;
    use serde_json::json;

    fn potato() -> ResolvedRouter {
        resolve(&RouterConfig::new(SchemaConfig::new(
            "Potato",
            vec![
                FieldConfig::new("id", FieldType::Integer),
                FieldConfig::new("mass", FieldType::Float),
                FieldConfig::new("color", FieldType::String),
            ],
        )))
        .unwrap()
    }

    #[test]
    fn select_list_with_filters_sort_and_window() {
        let query = ListQuery {
            filters: vec![
                FilterSpec { field: "color".into(), op: FilterOp::ILike, value: json!("b%") },
                FilterSpec { field: "mass".into(), op: FilterOp::In, value: json!([1, 2]) },
            ],
            sort: vec![SortSpec { field: "mass".into(), direction: SortDirection::Desc }],
            window: Some(Window { offset: 10, limit: 5 }),
        };
        let q = select_list(&potato(), &query);
        assert_eq!(
            q.sql,
            "SELECT \"id\", \"mass\", \"color\" FROM \"potato\" WHERE \"color\"::text ILIKE $1::text AND \"mass\" IN ($2::double precision, $3::double precision) ORDER BY \"mass\" DESC NULLS LAST, \"id\" ASC LIMIT 5 OFFSET 10"
        );
        assert_eq!(q.params, vec![
            PgBindValue::String("b%".into()),
            PgBindValue::F64(1.0),
            PgBindValue::F64(2.0),
        ]);
    }

    #[test]
    fn count_shares_where_clause() {
        let filters = vec![FilterSpec { field: "color".into(), op: FilterOp::Eq, value: Value::Null }];
        let q = count(&potato(), &filters);
        assert_eq!(q.sql, "SELECT COUNT(*) FROM \"potato\" WHERE \"color\" IS NULL");
        assert!(q.params.is_empty());
    }

    #[test]
    fn insert_skips_absent_columns() {
        let body = json!({ "mass": 1.5, "color": "Brown" }).as_object().cloned().unwrap();
        let q = insert(&potato(), &body);
        assert_eq!(
            q.sql,
            "INSERT INTO \"potato\" (\"mass\", \"color\") VALUES ($1::double precision, $2::text) RETURNING \"id\", \"mass\", \"color\""
        );
    }

    #[test]
    fn update_never_sets_pk_and_binds_id_last() {
        let body = json!({ "id": 9, "color": "Red" }).as_object().cloned().unwrap();
        let q = update(&potato(), &json!(3), &body);
        assert_eq!(
            q.sql,
            "UPDATE \"potato\" SET \"color\" = $1::text WHERE \"id\" = $2::bigint RETURNING \"id\", \"mass\", \"color\""
        );
        assert_eq!(q.params[1], PgBindValue::I64(3));

        let empty = update(&potato(), &json!(3), &Map::new());
        assert!(empty.sql.starts_with("SELECT"));
    }

    #[test]
    fn identifiers_are_quoted_and_schema_qualified() {
        assert_eq!(quoted("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(qualified_table("inventory.potato"), "\"inventory\".\"potato\"");
        assert_eq!(delete_all(&potato()).sql, "DELETE FROM \"potato\"");
    }
}
