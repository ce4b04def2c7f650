//! Evaluation of shell-backed variables
//!
//! A dynamic variable runs its command once per process: results are
//! memoized by command text in a [`DynamicCache`] shared by every task and
//! every thread using the same evaluator. Each command has its own slot
//! lock, so two different uncached commands may run at the same time while
//! callers asking for the same command wait for the first run to finish.
//! A failed command's slot is dropped, and the next caller runs it again.

use crate::error::{VariableError, VariableResult};
use crate::runner::{
    stderr_sink, CommandRunner, Logger, RunOptions, SharedWriter, ShellRunner, Sink,
};
use crate::vars::Var;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

type Slot = Arc<Mutex<Option<String>>>;

/// Command text to single-line result
#[derive(Debug, Default)]
pub struct DynamicCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl DynamicCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `command`, created on first use
    fn slot(&self, command: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(command.to_string()).or_default().clone()
    }

    /// Cached result for `command`, if it has run successfully
    pub fn get(&self, command: &str) -> Option<String> {
        let slot = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(command)
            .cloned()?;
        let value = slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
        value
    }

    /// Drop the slot for a failed `command` unless another caller holds it
    ///
    /// A waiter still holding the slot retries the command itself, so the
    /// slot stays until the last such caller gives up on it.
    fn release(&self, command: &str, slot: &Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let ours = slots.get(command).is_some_and(|s| Arc::ptr_eq(s, slot));
        // one reference in the map, one held by the caller
        if ours && Arc::strong_count(slot) == 2 {
            slots.remove(command);
        }
    }

    /// Number of cached results
    ///
    /// Slots are checked after the map lock is released, so a command that
    /// is still running doesn't block lookups of other commands.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        slots
            .iter()
            .filter(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).is_some())
            .count()
    }

    /// Number of commands with a slot, run or running
    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Turns variable values into strings, running shell commands as needed
#[derive(Clone)]
pub struct DynamicEvaluator {
    cache: Arc<DynamicCache>,
    runner: Arc<dyn CommandRunner>,
    dir: PathBuf,
    stderr: Sink,
    logger: Logger,
}

impl DynamicEvaluator {
    /// Evaluator running commands in `dir` through `sh -c`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DynamicEvaluator {
            cache: Arc::new(DynamicCache::new()),
            runner: Arc::new(ShellRunner::new()),
            dir: dir.into(),
            stderr: stderr_sink(),
            logger: Logger::default(),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Share a cache with other evaluators
    pub fn with_cache(mut self, cache: Arc<DynamicCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Where commands' standard error goes
    pub fn with_stderr(mut self, stderr: Sink) -> Self {
        self.stderr = stderr;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn cache(&self) -> &Arc<DynamicCache> {
        &self.cache
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve `var` to its string value
    ///
    /// Literals are returned as-is without touching the cache.
    pub fn resolve(&self, var: &Var) -> VariableResult<String> {
        match var {
            Var::Literal(value) => Ok(value.clone()),
            Var::Shell(command) => self.evaluate(command),
        }
    }

    fn evaluate(&self, command: &str) -> VariableResult<String> {
        let slot = self.cache.slot(command);
        // held for the whole run: at most one execution per command
        let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(result) = cached.as_ref() {
            return Ok(result.clone());
        }

        let result = match self.run(command) {
            Ok(result) => result,
            Err(e) => {
                self.cache.release(command, &slot);
                return Err(e);
            }
        };
        self.logger.print_debug(&format!(
            "dynamic variable: \"{}\", result: \"{}\"",
            command, result
        ));
        *cached = Some(result.clone());
        Ok(result)
    }

    fn run(&self, command: &str) -> VariableResult<String> {
        let mut stdout = Vec::new();
        let mut stderr = SharedWriter::new(self.stderr.clone());
        self.runner
            .run(
                RunOptions::new(command, &self.dir)
                    .stdout(&mut stdout)
                    .stderr(&mut stderr),
            )
            .map_err(|source| VariableError::Command {
                cmd: command.to_string(),
                source,
            })?;

        single_line(command, &String::from_utf8_lossy(&stdout))
    }
}

/// Drop one trailing newline, reject anything still spanning lines
fn single_line(command: &str, output: &str) -> VariableResult<String> {
    let line = output.strip_suffix('\n').unwrap_or(output);
    if line.contains('\n') {
        return Err(VariableError::MultilineResult {
            cmd: command.to_string(),
        });
    }
    Ok(line.trim().to_string())
}
