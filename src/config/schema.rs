//! Taskfile validation
//!
//! Catches mistakes that would otherwise only surface halfway through a run.

use crate::config::types::{Cmd, Taskfile};
use crate::error::{ConfigError, ConfigResult};
use crate::vars::{Template, Var};
use std::collections::HashSet;

/// Validate a complete Taskfile
pub fn validate_config(taskfile: &Taskfile) -> ConfigResult<()> {
    if let Some(interpreter) = &taskfile.interpreter {
        if interpreter.is_empty() {
            return Err(ConfigError::Invalid("interpreter must not be empty".to_string()));
        }
    }

    for (name, task) in &taskfile.tasks {
        if name.trim().is_empty() {
            return Err(ConfigError::Invalid("task names must not be empty".to_string()));
        }

        let templates = task
            .vars
            .values()
            .map(var_text)
            .chain(task.dir.as_deref())
            .chain(task.cmds.iter().map(Cmd::text));
        for text in templates {
            check_template(name, text)?;
        }

        for called in static_calls(&task.cmds) {
            if !taskfile.tasks.contains_key(called) {
                return Err(ConfigError::TaskNotFound(called.to_string()));
            }
        }
    }

    detect_circular_task_calls(taskfile)
}

fn var_text(var: &Var) -> &str {
    match var {
        Var::Literal(text) | Var::Shell(text) => text,
    }
}

fn check_template(task: &str, text: &str) -> ConfigResult<()> {
    Template::parse(text)
        .map(|_| ())
        .map_err(|e| ConfigError::Invalid(format!("task '{}': {}", task, e)))
}

/// Called task names known before variables are resolved
fn static_calls(cmds: &[Cmd]) -> impl Iterator<Item = &str> {
    cmds.iter().filter_map(|cmd| match cmd {
        Cmd::Task(call) if !call.task.contains("{{") => Some(call.task.as_str()),
        _ => None,
    })
}

/// Detect cycles among statically named task calls
fn detect_circular_task_calls(taskfile: &Taskfile) -> ConfigResult<()> {
    let mut visited = HashSet::new();
    for task_name in taskfile.tasks.keys() {
        let mut stack = Vec::new();
        check_task_cycle(taskfile, task_name, &mut visited, &mut stack)?;
    }
    Ok(())
}

/// Recursively check for cycles in task calls
fn check_task_cycle<'a>(
    taskfile: &'a Taskfile,
    task_name: &'a str,
    visited: &mut HashSet<&'a str>,
    stack: &mut Vec<&'a str>,
) -> ConfigResult<()> {
    // Check if we've found a cycle
    if stack.contains(&task_name) {
        stack.push(task_name);
        return Err(ConfigError::CircularDependency(stack.join(" -> ")));
    }

    // Skip if already fully processed
    if visited.contains(task_name) {
        return Ok(());
    }

    let task = taskfile
        .tasks
        .get(task_name)
        .ok_or_else(|| ConfigError::TaskNotFound(task_name.to_string()))?;

    stack.push(task_name);
    for called in static_calls(&task.cmds) {
        check_task_cycle(taskfile, called, visited, stack)?;
    }

    // Remove from stack and mark as visited
    stack.pop();
    visited.insert(task_name);

    Ok(())
}
