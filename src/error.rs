//! Error types for vartask

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vartask operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vartask
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Variable resolution errors
    #[error("Variable error: {0}")]
    Variable(#[from] VariableError),

    /// Template errors raised outside of variable resolution
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Task execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Taskfile discovery and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find Taskfile (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Task '{0}' is not defined")]
    TaskNotFound(String),

    #[error("Task '{0}' calls itself recursively (stack: {1})")]
    RecursiveCall(String, String),

    #[error("Circular task calls detected: {0}")]
    CircularDependency(String),

    #[error("Failed to read variables file '{path}': {error}")]
    VarsFile { path: PathBuf, error: String },
}

/// Template parse and execution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template syntax error in {template:?}: {message}")]
    Syntax { template: String, message: String },

    #[error("template execution error in {template:?}: {message}")]
    Exec { template: String, message: String },
}

/// Errors raised while decoding or resolving variables
#[derive(Error, Debug)]
pub enum VariableError {
    #[error("can't unmarshal var value: {0}")]
    Malformed(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("dynamic variable command {cmd:?} failed: {source}")]
    Command {
        cmd: String,
        #[source]
        source: ExecutionError,
    },

    #[error("got multiline result from command {cmd:?}")]
    MultilineResult { cmd: String },

    #[error("Task '{0}' is not defined")]
    TaskNotFound(String),
}

/// Process execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command failed with exit code {0:?}")]
    CommandFailed(Option<i32>),

    #[error("Failed to start command: {0}")]
    Spawn(#[source] io::Error),

    #[error("Failed to forward command output: {0}")]
    Io(#[source] io::Error),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for template operations
pub type TemplateResult<T> = std::result::Result<T, TemplateError>;

/// Specialized result type for variable operations
pub type VariableResult<T> = std::result::Result<T, VariableError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;
