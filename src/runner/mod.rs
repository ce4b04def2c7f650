//! Task execution engine
//!
//! This module handles running commands, logging, and walking task calls.

pub mod command;
pub mod context;
pub mod task;

// Re-export main types
pub use command::*;
pub use context::*;
pub use task::*;
