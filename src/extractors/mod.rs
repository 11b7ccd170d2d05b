//! Request extractors shared by the generated handlers.

pub mod json;
pub use json::JsonBody;
