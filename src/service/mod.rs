//! Request-side services shared by every backend.

mod validation;
pub use validation::RequestValidator;
pub(crate) use validation::coerce;
