//! Per-route guards: checks that run before a generated handler and may reject the request.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{request::Parts, HeaderName, HeaderValue},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use std::sync::Arc;

#[async_trait]
pub trait Guard: Send + Sync {
    async fn check(&self, parts: &Parts) -> Result<(), AppError>;
}

/// Rejects with 401 unless a header is present (and, optionally, equal to a value).
#[derive(Clone, Debug)]
pub struct RequireHeader {
    name: HeaderName,
    expected: Option<HeaderValue>,
}

impl RequireHeader {
    pub fn present(name: HeaderName) -> Self {
        Self { name, expected: None }
    }

    pub fn equals(name: HeaderName, value: HeaderValue) -> Self {
        Self {
            name,
            expected: Some(value),
        }
    }
}

#[async_trait]
impl Guard for RequireHeader {
    async fn check(&self, parts: &Parts) -> Result<(), AppError> {
        match (parts.headers.get(&self.name), &self.expected) {
            (None, _) => Err(AppError::Unauthorized(format!("missing {} header", self.name))),
            (Some(got), Some(want)) if got != want => {
                Err(AppError::Unauthorized(format!("invalid {} header", self.name)))
            }
            _ => Ok(()),
        }
    }
}

async fn run_guards(guards: Arc<[Arc<dyn Guard>]>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    for g in guards.iter() {
        if let Err(e) = g.check(&parts).await {
            tracing::debug!(path = %parts.uri.path(), error = %e, "guard rejected request");
            return e.into_response();
        }
    }
    next.run(Request::from_parts(parts, body)).await
}

/// Wrap `route` so every guard runs, in order, before it.
pub fn guarded<S>(route: MethodRouter<S>, guards: &[Arc<dyn Guard>]) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    if guards.is_empty() {
        return route;
    }
    let guards: Arc<[Arc<dyn Guard>]> = guards.to_vec().into();
    route.route_layer(middleware::from_fn(move |req: Request, next: Next| {
        run_guards(guards.clone(), req, next)
    }))
}
