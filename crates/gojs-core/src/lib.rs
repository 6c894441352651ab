#[macro_use]
pub mod macros;

pub mod ast;
pub mod config;
pub mod error;
pub mod semantic;
pub mod span;
pub mod types;

// Re-export commonly used items for convenience
pub use tracing;

pub use semantic::{SemanticModel, TypeInfo};

// Alias for error types
pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
