//! Integration tests for task execution

#![cfg(unix)]

mod common;

use vartask::config::{parse_config_file, validate_config};
use vartask::error::{Error, VariableError};
use vartask::runner::{Executor, Logger, Verbosity};
use vartask::vars::{Call, Var, Vars};

fn executor(yaml: &str) -> (tempfile::TempDir, Executor) {
    let (temp_dir, config_path) = common::create_test_config(yaml);
    let taskfile = parse_config_file(&config_path).unwrap();
    validate_config(&taskfile).unwrap();
    let executor = Executor::new(taskfile, temp_dir.path(), Logger::new(Verbosity::Silent));
    (temp_dir, executor)
}

#[test]
fn test_execute_simple_task() {
    let (dir, executor) = executor(
        r#"
tasks:
  hello:
    cmds: echo "Hello, World!" > out.txt
"#,
    );
    executor.run(&Call::new("hello")).unwrap();
    assert_eq!(common::read_output(&dir, "out.txt"), "Hello, World!");
}

#[test]
fn test_execute_task_with_variables() {
    let (dir, executor) = executor(
        r#"
vars:
  NAME: Rust
tasks:
  greet:
    vars:
      GREETING: "Hello, {{.NAME}}"
      SHOUT: "$echo {{.NAME}} | tr a-z A-Z"
    cmds: echo "{{.GREETING}} {{.SHOUT}}" > out.txt
"#,
    );
    executor.run(&Call::new("greet")).unwrap();
    assert_eq!(common::read_output(&dir, "out.txt"), "Hello, Rust RUST");
}

#[test]
fn test_call_overrides_are_not_templated() {
    let (dir, executor) = executor(
        r#"
tasks:
  greet:
    cmds: printf '%s' '{{.NAME}}' > out.txt
"#,
    );
    let executor = executor.with_environment(Vars::new);
    let call = Call::new("greet").with_var("NAME", Var::literal("{{.OTHER}}"));
    executor.run(&call).unwrap();
    assert_eq!(common::read_output(&dir, "out.txt"), "{{.OTHER}}");
}

#[test]
fn test_dynamic_variable_runs_once() {
    let (dir, executor) = executor(
        r#"
vars:
  COUNT: "$echo x >> count.txt; wc -l < count.txt | tr -d ' '"
tasks:
  first:
    cmds:
      - echo {{.COUNT}} > first.txt
      - task: second
  second:
    cmds: echo {{.COUNT}} > second.txt
"#,
    );
    executor.run(&Call::new("first")).unwrap();
    assert_eq!(common::read_output(&dir, "count.txt"), "x");
    assert_eq!(common::read_output(&dir, "first.txt"), "1");
    assert_eq!(common::read_output(&dir, "second.txt"), "1");
}

#[test]
fn test_task_runs_in_its_dir() {
    let (dir, executor) = executor(
        r#"
tasks:
  build:
    dir: "{{.SUB}}"
    vars:
      SUB: subdir
    cmds: pwd > where.txt
"#,
    );
    std::fs::create_dir(dir.path().join("subdir")).unwrap();
    executor.run(&Call::new("build")).unwrap();
    let where_ = common::read_output(&dir, "subdir/where.txt");
    assert!(where_.ends_with("subdir"));
}

#[test]
fn test_execute_task_with_failing_command() {
    let (dir, executor) = executor(
        r#"
tasks:
  fail:
    cmds:
      - "false"
      - touch never.txt
"#,
    );
    let err = executor.run(&Call::new("fail")).unwrap_err();
    assert!(matches!(err, Error::Execution(_)));
    assert!(!dir.path().join("never.txt").exists());
}

#[test]
fn test_failing_dynamic_variable() {
    let (_dir, executor) = executor(
        r#"
tasks:
  build:
    vars:
      BROKEN: "$exit 3"
    cmds: echo {{.BROKEN}}
"#,
    );
    let err = executor.run(&Call::new("build")).unwrap_err();
    assert!(matches!(
        err,
        Error::Variable(VariableError::Command { ref cmd, .. }) if cmd == "exit 3"
    ));
    assert!(executor.resolver().evaluator().cache().is_empty());
}
