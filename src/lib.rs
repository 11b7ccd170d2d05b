//! crud-router: generated list/get/create/update/delete REST routes over a schema and a storage backend.

pub mod app;
pub mod backend;
pub mod case;
pub mod config;
pub mod error;
pub mod extractors;
pub mod guard;
pub mod handlers;
pub mod migration;
pub mod openapi;
pub mod pagination;
pub mod query;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;
pub mod telemetry;

pub use app::{build_app, AppOptions};
pub use backend::{CrudBackend, ListQuery, ListResult, MemoryBackend, PgBackend, Window};
pub use config::{load_from_path, resolve, resolve_all, FullConfig, ResolvedRouter, RouterConfig};
pub use error::{AppError, ConfigError};
pub use guard::{Guard, RequireHeader};
pub use migration::apply_migrations;
pub use openapi::openapi_document;
pub use pagination::PageParams;
pub use response::{ListBody, Page};
pub use routes::{common_routes_with_ready, CrudRouter, RouteName};
pub use settings::{BackendKind, LogFormat, Settings};
pub use state::CrudState;
pub use store::{connect_pool, ensure_database_exists};
pub use telemetry::init_tracing;
