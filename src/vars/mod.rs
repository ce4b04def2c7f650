//! Task variables
//!
//! Declarations are decoded into [`Var`]s, merged per call by the
//! [`Resolver`], and shell-backed values are computed once by the
//! [`DynamicEvaluator`].

pub mod dynamic;
pub mod env;
pub mod resolve;
pub mod template;
pub mod var;

// Re-export main types
pub use dynamic::{DynamicCache, DynamicEvaluator};
pub use resolve::{Call, Resolver, TaskStore};
pub use template::{substitute, substitute_all, Template};
pub use var::{to_string_map, Var, Vars};
