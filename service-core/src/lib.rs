//! service-core: Shared infrastructure for the field-service billing crates.
pub mod config;
pub mod error;
pub mod observability;
pub mod utils;

pub use serde;
pub use serde_json;
pub use tracing;
pub use validator;
