// Core modules
pub mod bootstrap;
pub mod error;
pub mod input;
pub mod pipes;
pub mod plan;
pub mod workspace;

// Re-export commonly used types
pub use error::{GoplateError, Result};
