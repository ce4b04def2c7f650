//! vartask - run Taskfile tasks with layered, templated variables
//!
//! Variables come from the Taskfile, the task, the environment, and the
//! caller. Task-local declarations are rendered with a Go-style template
//! engine, and `sh:` values are computed by running a shell command once
//! per process.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod vars;

// Re-export commonly used types
pub use error::{Error, Result};

/// Current version of vartask
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
