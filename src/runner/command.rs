//! Command execution
//!
//! This module handles running shell commands through the configured
//! interpreter.

use crate::error::{ExecutionError, ExecutionResult};
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use std::thread;

/// What to run and where its output goes
///
/// A `None` stream is inherited from the current process.
pub struct RunOptions<'a> {
    pub command: &'a str,
    pub dir: &'a Path,
    pub stdout: Option<&'a mut (dyn Write + Send)>,
    pub stderr: Option<&'a mut (dyn Write + Send)>,
}

impl<'a> RunOptions<'a> {
    /// Run `command` in `dir` with inherited output
    pub fn new(command: &'a str, dir: &'a Path) -> Self {
        RunOptions {
            command,
            dir,
            stdout: None,
            stderr: None,
        }
    }

    /// Capture standard output into `writer`
    pub fn stdout(mut self, writer: &'a mut (dyn Write + Send)) -> Self {
        self.stdout = Some(writer);
        self
    }

    /// Stream standard error into `writer`
    pub fn stderr(mut self, writer: &'a mut (dyn Write + Send)) -> Self {
        self.stderr = Some(writer);
        self
    }
}

/// Synchronous process execution
///
/// Fails when the command can't be started or exits unsuccessfully.
pub trait CommandRunner: Send + Sync {
    fn run(&self, opts: RunOptions<'_>) -> ExecutionResult<()>;
}

/// Runs commands as `<interpreter...> <command>`
#[derive(Debug, Clone)]
pub struct ShellRunner {
    interpreter: Vec<String>,
}

impl ShellRunner {
    pub fn new() -> Self {
        ShellRunner {
            interpreter: default_interpreter(),
        }
    }

    /// Set the interpreter (e.g. `["bash", "-c"]`)
    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn interpreter(&self) -> &[String] {
        &self.interpreter
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(windows)]
fn default_interpreter() -> Vec<String> {
    vec!["cmd".to_string(), "/C".to_string()]
}

#[cfg(not(windows))]
fn default_interpreter() -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string()]
}

impl CommandRunner for ShellRunner {
    fn run(&self, opts: RunOptions<'_>) -> ExecutionResult<()> {
        let RunOptions {
            command: script,
            dir,
            stdout,
            stderr,
        } = opts;

        let Some((program, args)) = self.interpreter.split_first() else {
            return Err(ExecutionError::Spawn(io::Error::new(
                io::ErrorKind::InvalidInput,
                "interpreter is empty",
            )));
        };

        let mut command = StdCommand::new(program);
        command.args(args).arg(script).current_dir(dir);
        command.stdin(Stdio::inherit());
        command.stdout(pipe_if(stdout.is_some()));
        command.stderr(pipe_if(stderr.is_some()));

        let mut child = command.spawn().map_err(ExecutionError::Spawn)?;
        let child_stdout = child.stdout.take();
        let child_stderr = child.stderr.take();

        // Forward stderr on its own thread so a full pipe can't stall stdout
        let forwarded = thread::scope(|scope| {
            let stderr_thread = match (child_stderr, stderr) {
                (Some(mut pipe), Some(sink)) => {
                    Some(scope.spawn(move || io::copy(&mut pipe, sink).map(|_| ())))
                }
                _ => None,
            };

            let out = match (child_stdout, stdout) {
                (Some(mut pipe), Some(sink)) => io::copy(&mut pipe, sink).map(|_| ()),
                _ => Ok(()),
            };

            let err = match stderr_thread {
                Some(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(io::Error::other("stderr forwarding panicked"))),
                None => Ok(()),
            };

            out.and(err)
        });

        let status = child.wait().map_err(ExecutionError::Spawn)?;
        forwarded.map_err(ExecutionError::Io)?;

        if !status.success() {
            return Err(ExecutionError::CommandFailed(status.code()));
        }
        Ok(())
    }
}

fn pipe_if(capture: bool) -> Stdio {
    if capture {
        Stdio::piped()
    } else {
        Stdio::inherit()
    }
}
