//! Generated CRUD routes for one resolved router.
//! Collection routes live at `{prefix}` and `{prefix}/`, item routes at `{prefix}/:param` and `{prefix}/:param/`.

use crate::backend::{CrudBackend, MemoryBackend, PgBackend};
use crate::config::ResolvedRouter;
use crate::error::ConfigError;
use crate::guard::{guarded, Guard};
use crate::handlers::crud::{create, delete_all, delete_one, list, read, update};
use crate::state::CrudState;
use axum::{
    routing::{delete, get, patch, post, MethodRouter},
    Router,
};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteName {
    GetAll,
    Create,
    DeleteAll,
    GetOne,
    Update,
    DeleteOne,
}

impl RouteName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteName::GetAll => "get_all",
            RouteName::Create => "create",
            RouteName::DeleteAll => "delete_all",
            RouteName::GetOne => "get_one",
            RouteName::Update => "update",
            RouteName::DeleteOne => "delete_one",
        }
    }

    /// Item routes take the primary key as a path parameter.
    pub fn is_item(&self) -> bool {
        matches!(self, RouteName::GetOne | RouteName::Update | RouteName::DeleteOne)
    }

    fn handler(&self) -> MethodRouter<CrudState> {
        match self {
            RouteName::GetAll => get(list),
            RouteName::Create => post(create),
            RouteName::DeleteAll => delete(delete_all),
            RouteName::GetOne => get(read),
            RouteName::Update => patch(update),
            RouteName::DeleteOne => delete(delete_one),
        }
    }
}

pub struct CrudRouter {
    state: CrudState,
    guards: HashMap<RouteName, Vec<Arc<dyn Guard>>>,
    replacements: HashMap<RouteName, MethodRouter<CrudState>>,
}

impl CrudRouter {
    /// Registration order. Collection routes come before item routes.
    pub const ROUTES: [RouteName; 6] = [
        RouteName::GetAll,
        RouteName::Create,
        RouteName::DeleteAll,
        RouteName::GetOne,
        RouteName::Update,
        RouteName::DeleteOne,
    ];

    pub fn new(router: ResolvedRouter, backend: Arc<dyn CrudBackend>) -> Self {
        Self {
            state: CrudState {
                router: Arc::new(router),
                backend,
            },
            guards: HashMap::new(),
            replacements: HashMap::new(),
        }
    }

    /// Router over a fresh in-memory store. Needs an integer primary key.
    pub fn memory(router: ResolvedRouter) -> Result<Self, ConfigError> {
        let backend = MemoryBackend::for_router(&router)?;
        Ok(Self::new(router, Arc::new(backend)))
    }

    pub fn postgres(router: ResolvedRouter, pool: PgPool) -> Self {
        let router = Arc::new(router);
        let backend = Arc::new(PgBackend::new(pool, router.clone()));
        Self {
            state: CrudState { router, backend },
            guards: HashMap::new(),
            replacements: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ResolvedRouter {
        &self.state.router
    }

    pub fn backend(&self) -> Arc<dyn CrudBackend> {
        self.state.backend.clone()
    }

    /// Enabled in config, or replaced with a custom handler.
    pub fn is_enabled(&self, route: RouteName) -> bool {
        if self.replacements.contains_key(&route) {
            return true;
        }
        let t = &self.state.router.routes;
        match route {
            RouteName::GetAll => t.get_all,
            RouteName::Create => t.create,
            RouteName::DeleteAll => t.delete_all,
            RouteName::GetOne => t.get_one,
            RouteName::Update => t.update,
            RouteName::DeleteOne => t.delete_one,
        }
    }

    /// Run `guard` before `route`. Guards run in the order they were added.
    pub fn guard(mut self, route: RouteName, guard: impl Guard + 'static) -> Self {
        self.guards.entry(route).or_default().push(Arc::new(guard));
        self
    }

    /// Run `guard` before every route.
    pub fn guard_all(mut self, guard: Arc<dyn Guard>) -> Self {
        for route in Self::ROUTES {
            self.guards.entry(route).or_default().push(guard.clone());
        }
        self
    }

    /// Serve `route` with `handler` instead of the generated one, at the same paths.
    /// The handler must only answer `route`'s method.
    pub fn replace(mut self, route: RouteName, handler: MethodRouter<CrudState>) -> Self {
        self.replacements.insert(route, handler);
        self
    }

    pub fn into_router(mut self) -> Router {
        let mut collection: Option<MethodRouter<CrudState>> = None;
        let mut item: Option<MethodRouter<CrudState>> = None;
        let mut mounted = Vec::new();

        for route in Self::ROUTES {
            if !self.is_enabled(route) {
                continue;
            }
            let handler = self
                .replacements
                .remove(&route)
                .unwrap_or_else(|| route.handler());
            let handler = match self.guards.get(&route) {
                Some(g) => guarded(handler, g),
                None => handler,
            };
            let slot = if route.is_item() { &mut item } else { &mut collection };
            *slot = Some(match slot.take() {
                Some(existing) => existing.merge(handler),
                None => handler,
            });
            mounted.push(route.as_str());
        }

        let cfg = self.state.router.clone();
        tracing::info!(
            prefix = %cfg.prefix,
            backend = self.state.backend.name(),
            routes = ?mounted,
            "mounted crud routes"
        );

        let mut router = Router::new();
        if let Some(mr) = collection {
            router = router
                .route(&cfg.prefix, mr.clone())
                .route(&format!("{}/", cfg.prefix), mr);
        }
        if let Some(mr) = item {
            let path = format!("{}/:{}", cfg.prefix, cfg.path_param_name);
            router = router
                .route(&path, mr.clone())
                .route(&format!("{}/", path), mr);
        }
        router.with_state(self.state)
    }
}
