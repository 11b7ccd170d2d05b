pub mod common;
pub mod crud;

pub use common::{common_routes_with_ready, ReadyState};
pub use crud::{CrudRouter, RouteName};
