//! Core configuration types
//!
//! This module defines the data structures that represent a Taskfile.

use crate::vars::{TaskStore, Vars};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Top-level Taskfile structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Taskfile {
    /// Interpreter used for commands and dynamic variables (e.g., ["sh", "-c"])
    #[serde(default)]
    pub interpreter: Option<Vec<String>>,

    /// Global variable declarations
    #[serde(default)]
    pub vars: Vars,

    /// Tasks defined in the Taskfile
    #[serde(default)]
    pub tasks: HashMap<String, Task>,
}

/// A task definition
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Task {
    /// Description shown by `--list`
    #[serde(default)]
    pub desc: Option<String>,

    /// Working directory, templated, relative to the Taskfile
    #[serde(default)]
    pub dir: Option<String>,

    /// Task-local variable declarations
    #[serde(default)]
    pub vars: Vars,

    /// Commands to run, in order
    #[serde(default, deserialize_with = "deserialize_cmds")]
    pub cmds: Vec<Cmd>,

    /// Don't echo commands before running them
    #[serde(default)]
    pub silent: bool,
}

/// An entry of a task's `cmds`
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Shell command, templated before it runs
    Command(String),

    /// Call to another task
    Task(TaskCall),
}

/// `- task: NAME` with optional overrides
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskCall {
    /// Name of the task to run, templated
    pub task: String,

    /// Overrides handed to the called task
    #[serde(default)]
    pub vars: Vars,
}

impl Cmd {
    /// The templated text: the command line, or the called task's name
    pub fn text(&self) -> &str {
        match self {
            Cmd::Command(command) => command,
            Cmd::Task(call) => &call.task,
        }
    }
}

impl<'de> Deserialize<'de> for Cmd {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;
        use serde_yaml::Value;

        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Cmd::Command(s)),
            value @ Value::Mapping(_) => serde_yaml::from_value(value)
                .map(Cmd::Task)
                .map_err(D::Error::custom),
            _ => Err(D::Error::custom(
                "cmd must be a string or a mapping with `task`",
            )),
        }
    }
}

impl TaskStore for Taskfile {
    fn task_vars(&self, task: &str) -> Option<&Vars> {
        self.tasks.get(task).map(|t| &t.vars)
    }
}

/// Custom deserializer for commands that handles both single values and arrays
fn deserialize_cmds<'de, D>(deserializer: D) -> Result<Vec<Cmd>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        // Single string command
        Value::String(s) => Ok(vec![Cmd::Command(s)]),
        // Array of commands
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| serde_yaml::from_value(item).map_err(D::Error::custom))
            .collect(),
        // Null or not present
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("cmds must be a string or array")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::Var;

    #[test]
    fn test_deserialize_simple_taskfile() {
        let yaml = r#"
tasks:
  hello:
    cmds: echo "hello"
"#;
        let taskfile: Taskfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(taskfile.tasks.len(), 1);
        assert_eq!(
            taskfile.tasks["hello"].cmds,
            vec![Cmd::Command("echo \"hello\"".to_string())]
        );
    }

    #[test]
    fn test_deserialize_vars_and_task_calls() {
        let yaml = r#"
vars:
  NAME: app
tasks:
  build:
    desc: Build it
    dir: out
    vars:
      VERSION: "$git describe"
      DATE: {sh: "date +%F"}
    cmds:
      - echo {{.VERSION}}
      - task: release
        vars:
          CHANNEL: beta
  release:
    cmds: []
"#;
        let taskfile: Taskfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(taskfile.vars["NAME"], Var::literal("app"));

        let build = &taskfile.tasks["build"];
        assert_eq!(build.desc.as_deref(), Some("Build it"));
        assert_eq!(build.vars["VERSION"], Var::shell("git describe"));
        assert_eq!(build.vars["DATE"], Var::shell("date +%F"));
        assert_eq!(build.cmds.len(), 2);

        let Cmd::Task(call) = &build.cmds[1] else {
            panic!("expected a task call");
        };
        assert_eq!(call.task, "release");
        assert_eq!(call.vars["CHANNEL"], Var::literal("beta"));
        assert_eq!(build.cmds[1].text(), "release");
    }

    #[test]
    fn test_malformed_variable_is_rejected() {
        let yaml = r#"
tasks:
  build:
    vars:
      BAD: [1, 2]
"#;
        let err = serde_yaml::from_str::<Taskfile>(yaml).unwrap_err();
        assert!(err.to_string().contains("can't unmarshal var value"));
    }

    #[test]
    fn test_malformed_cmd_is_rejected() {
        let yaml = r#"
tasks:
  build:
    cmds:
      - 42
"#;
        assert!(serde_yaml::from_str::<Taskfile>(yaml).is_err());
    }

    #[test]
    fn test_task_store() {
        let yaml = r#"
tasks:
  build:
    vars:
      A: "1"
"#;
        let taskfile: Taskfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(taskfile.task_vars("build").unwrap().len(), 1);
        assert!(taskfile.task_vars("missing").is_none());
    }
}
