//! Shared state for one generated router: its resolved config and its backend.

use crate::backend::CrudBackend;
use crate::config::ResolvedRouter;
use std::sync::Arc;

#[derive(Clone)]
pub struct CrudState {
    pub router: Arc<ResolvedRouter>,
    pub backend: Arc<dyn CrudBackend>,
}
