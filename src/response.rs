//! Response bodies for the list route.

use crate::pagination::PageParams;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
    pub pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, params: PageParams) -> Self {
        Page {
            items,
            total,
            page: params.page,
            size: params.size,
            pages: params.pages(total),
        }
    }
}

/// Plain array when pagination is off, a `Page` when it is on.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    Plain(Vec<T>),
    Paged(Page<T>),
}

impl<T: Serialize> IntoResponse for ListBody<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
