//! Execution context and diagnostic output
//!
//! The context tracks the chain of task calls for one run; the logger is the
//! shared, verbosity-aware sink every component reports through.

use colored::{ColoredString, Colorize};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// A writer shared between threads
pub type Sink = Arc<Mutex<dyn Write + Send>>;

/// Sink writing to the process standard error
pub fn stderr_sink() -> Sink {
    Arc::new(Mutex::new(io::stderr()))
}

/// `Write` adapter that locks a [`Sink`] per call
///
/// Lets several commands stream into one sink without holding its lock for
/// the lifetime of a command.
#[derive(Clone)]
pub struct SharedWriter(Sink);

impl SharedWriter {
    pub fn new(sink: Sink) -> Self {
        SharedWriter(sink)
    }
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).flush()
    }
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

/// Prefixed, coloured diagnostics filtered by verbosity
#[derive(Clone)]
pub struct Logger {
    verbosity: Verbosity,
    sink: Sink,
}

impl Logger {
    /// Logger writing to standard error
    pub fn new(verbosity: Verbosity) -> Self {
        Logger {
            verbosity,
            sink: stderr_sink(),
        }
    }

    /// Redirect output to another sink
    pub fn with_sink(mut self, sink: Sink) -> Self {
        self.sink = sink;
        self
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    fn emit(&self, min: Verbosity, prefix: ColoredString, message: &str) {
        if self.verbosity < min {
            return;
        }
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        // diagnostics are best effort
        let _ = writeln!(sink, "{} {}", prefix, message);
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        self.emit(Verbosity::Normal, "[INFO]".green(), message);
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        self.emit(Verbosity::Quiet, "[ERROR]".red().bold(), message);
    }

    /// Print debug message (only in verbose mode)
    pub fn print_debug(&self, message: &str) {
        self.emit(Verbosity::Verbose, "[DEBUG]".dimmed(), message);
    }

    /// Echo a command about to run
    pub fn print_run(&self, command: &str) {
        self.emit(Verbosity::Normal, "[RUN]".cyan(), command);
    }

    /// Print task start message
    pub fn print_task_start(&self, task_name: &str) {
        self.print_debug(&format!("Running task: {}", task_name));
    }

    /// Print task complete message
    pub fn print_task_complete(&self, task_name: &str) {
        self.print_debug(&format!("Task completed: {}", task_name));
    }
}

impl Default for Logger {
    fn default() -> Self {
        Logger::new(Verbosity::Normal)
    }
}

/// State of one run: the chain of tasks currently executing
#[derive(Debug, Default)]
pub struct Context {
    task_stack: Vec<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a task onto the execution stack
    pub fn push_task(&mut self, task_name: String) {
        self.task_stack.push(task_name);
    }

    /// Pop a task from the execution stack
    pub fn pop_task(&mut self) -> Option<String> {
        self.task_stack.pop()
    }

    /// Check if a task is in the execution stack (detect recursion)
    pub fn is_task_in_stack(&self, task_name: &str) -> bool {
        self.task_stack.iter().any(|t| t == task_name)
    }

    /// Get the current task name (top of stack)
    pub fn current_task(&self) -> Option<&String> {
        self.task_stack.last()
    }

    /// The stack rendered as `a -> b -> c`
    pub fn describe_stack(&self) -> String {
        self.task_stack.join(" -> ")
    }
}
