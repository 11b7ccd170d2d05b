//! CRUD handlers: list, create, delete all, read, update, delete one.

use crate::backend::{ListQuery, Window};
use crate::config::PkType;
use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::pagination::PageParams;
use crate::query::{parse_filters, parse_sort};
use crate::response::{ListBody, Page};
use crate::service::RequestValidator;
use crate::state::CrudState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

fn parse_id(state: &CrudState, id_str: &str) -> Result<Value, AppError> {
    let param = &state.router.path_param_name;
    Ok(match state.router.pk_type {
        PkType::Uuid => {
            let u = uuid::Uuid::parse_str(id_str)
                .map_err(|_| AppError::invalid("path", param, "value is not a valid uuid", "type_error.uuid"))?;
            Value::String(u.to_string())
        }
        PkType::Int => {
            let n: i64 = id_str
                .parse()
                .map_err(|_| AppError::invalid("path", param, "value is not a valid integer", "type_error.integer"))?;
            Value::Number(n.into())
        }
        PkType::Text => Value::String(id_str.to_string()),
    })
}

pub async fn list(
    State(state): State<CrudState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ListBody<Value>, AppError> {
    let router = &state.router;
    let filters = parse_filters(params.get("filter").map(String::as_str), &router.schema)?;
    let sort = parse_sort(params.get("sort").map(String::as_str), &router.schema)?;

    if router.pagination {
        let page = PageParams::from_query(&params)?;
        let query = ListQuery {
            filters,
            sort,
            window: Some(Window {
                offset: page.offset(),
                limit: page.limit(),
            }),
        };
        let result = state.backend.list(&query).await?;
        return Ok(ListBody::Paged(Page::new(result.items, result.total, page)));
    }

    let query = ListQuery {
        filters,
        sort,
        window: None,
    };
    let result = state.backend.list(&query).await?;
    Ok(ListBody::Plain(result.items))
}

pub async fn create(
    State(state): State<CrudState>,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let router = &state.router;
    let body = RequestValidator::validate_body(body, &router.create_schema, &router.validation)?;
    let row = state.backend.create(body).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn delete_all(State(state): State<CrudState>) -> Result<StatusCode, AppError> {
    let removed = state.backend.delete_all().await?;
    tracing::info!(prefix = %state.router.prefix, removed, "removed all records");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn read(State(state): State<CrudState>, Path(id_str): Path<String>) -> Result<Json<Value>, AppError> {
    let id = parse_id(&state, &id_str)?;
    let row = state.backend.get(&id).await?.ok_or_else(AppError::item_not_found)?;
    Ok(Json(row))
}

pub async fn update(
    State(state): State<CrudState>,
    Path(id_str): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, AppError> {
    let router = &state.router;
    let id = parse_id(&state, &id_str)?;
    let body = RequestValidator::validate_update(body, &router.update_schema, &router.validation)?;
    let row = state
        .backend
        .update(&id, body)
        .await?
        .ok_or_else(AppError::item_not_found)?;
    Ok(Json(row))
}

pub async fn delete_one(
    State(state): State<CrudState>,
    Path(id_str): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&state, &id_str)?;
    let row = state
        .backend
        .delete_one(&id)
        .await?
        .ok_or_else(AppError::item_not_found)?;
    Ok(Json(row))
}
