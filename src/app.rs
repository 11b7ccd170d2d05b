//! Assemble routers, docs, and common routes into one axum app.

use crate::openapi::{openapi_document, openapi_routes};
use crate::routes::{common_routes_with_ready, CrudRouter, ReadyState};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

#[derive(Clone, Debug)]
pub struct AppOptions {
    pub title: String,
    pub version: String,
    pub max_body_bytes: usize,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            title: "CRUD API".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Prefixes must be unique across `routers`; overlapping routes panic on merge.
pub fn build_app(routers: Vec<CrudRouter>, options: &AppOptions) -> Router {
    let doc = {
        let refs: Vec<&CrudRouter> = routers.iter().collect();
        openapi_document(&options.title, &options.version, &refs)
    };
    let ready = ReadyState {
        backends: routers
            .iter()
            .map(|r| (r.config().prefix.clone(), r.backend()))
            .collect(),
    };

    let mut app = Router::new()
        .merge(common_routes_with_ready(ready))
        .merge(openapi_routes(doc));
    for r in routers {
        app = app.merge(r.into_router());
    }
    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(options.max_body_bytes)),
    )
}
