//! Common routes: health, readiness, version.

use crate::backend::CrudBackend;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Backends checked by `/ready`, keyed by router prefix.
#[derive(Clone, Default)]
pub struct ReadyState {
    pub backends: Vec<(String, Arc<dyn CrudBackend>)>,
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    backends: BTreeMap<String, &'static str>,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(State(state): State<ReadyState>) -> Result<Json<ReadyBody>, (StatusCode, Json<ReadyBody>)> {
    let mut backends = BTreeMap::new();
    let mut degraded = false;
    for (prefix, backend) in &state.backends {
        let status = match backend.ping().await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::warn!(prefix = %prefix, backend = backend.name(), error = %e, "backend not ready");
                degraded = true;
                "unavailable"
            }
        };
        backends.insert(prefix.clone(), status);
    }
    if degraded {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                backends,
            }),
        ));
    }
    Ok(Json(ReadyBody { status: "ok", backends }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health, /version, /info, and /ready, which pings every backend.
pub fn common_routes_with_ready(state: ReadyState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .route("/info", get(version))
        .with_state(state)
}
