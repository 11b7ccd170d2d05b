#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use crud_router::{
    config::{FieldConfig, FieldType, SchemaConfig},
    resolve, AppOptions, CrudRouter, RouterConfig,
};
use serde_json::Value;
use tower::util::ServiceExt;

pub fn potato_config() -> RouterConfig {
    let mut cfg = RouterConfig::new(SchemaConfig::new(
        "Potato",
        vec![
            FieldConfig::new("id", FieldType::Integer),
            FieldConfig::new("thickness", FieldType::Float),
            FieldConfig::new("mass", FieldType::Float),
            FieldConfig::new("color", FieldType::String),
            FieldConfig::new("type", FieldType::String).optional(),
        ],
    ));
    cfg.prefix = Some("potato".into());
    cfg
}

pub fn carrot_config() -> RouterConfig {
    let mut cfg = RouterConfig::new(SchemaConfig::new(
        "Carrot",
        vec![
            FieldConfig::new("id", FieldType::Integer),
            FieldConfig::new("length", FieldType::Float),
            FieldConfig::new("color", FieldType::String)
                .optional()
                .with_default(Value::String("Orange".into())),
        ],
    ));
    cfg.prefix = Some("carrot".into());
    cfg
}

pub fn memory_router(cfg: &RouterConfig) -> CrudRouter {
    CrudRouter::memory(resolve(cfg).unwrap()).unwrap()
}

pub fn app(routers: Vec<CrudRouter>) -> Router {
    crud_router::build_app(routers, &AppOptions::default())
}

/// Percent-encode a query value.
pub fn encode(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with(app, method, uri, body, &[]).await
}

pub async fn send_with(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
        req = req.header(*k, *v);
    }
    let req = match body {
        Some(b) => req
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Send a raw body, optionally with a content type, and parse the JSON response.
pub async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    body: &str,
    content_type: Option<&str>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(ct) = content_type {
        req = req.header("content-type", ct);
    }
    let req = req.body(Body::from(body.to_string())).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}
