// Public modules
pub mod bundle;
pub mod environment;
pub mod error;
pub mod git;
pub mod publish;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
