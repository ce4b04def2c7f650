//! Task execution
//!
//! The executor resolves a call's variables, renders the task's directory
//! and commands with them, and runs the commands in order. A `task:` entry
//! runs another task, passing its `vars` as that call's overrides.

use crate::config::{Cmd, Task, Taskfile};
use crate::error::{ConfigError, Error, Result};
use crate::runner::{CommandRunner, Context, Logger, RunOptions, ShellRunner};
use crate::vars::{Call, DynamicEvaluator, Resolver, Var, Vars};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Runs tasks from one Taskfile
pub struct Executor {
    taskfile: Arc<Taskfile>,
    resolver: Resolver<Arc<Taskfile>>,
    runner: Arc<dyn CommandRunner>,
    dir: PathBuf,
    logger: Logger,
}

impl Executor {
    /// Create an executor for `taskfile`, running relative to `dir`
    pub fn new(taskfile: Taskfile, dir: impl Into<PathBuf>, logger: Logger) -> Self {
        let mut runner = ShellRunner::new();
        if let Some(interpreter) = &taskfile.interpreter {
            runner = runner.with_interpreter(interpreter.clone());
        }
        Self::with_runner(taskfile, dir, logger, Arc::new(runner))
    }

    /// Create an executor with a custom command runner
    pub fn with_runner(
        taskfile: Taskfile,
        dir: impl Into<PathBuf>,
        logger: Logger,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let dir = dir.into();
        let taskfile = Arc::new(taskfile);
        let evaluator = DynamicEvaluator::new(dir.clone())
            .with_runner(runner.clone())
            .with_logger(logger.clone());
        let resolver = Resolver::new(taskfile.clone(), taskfile.vars.clone(), evaluator);

        Executor {
            taskfile,
            resolver,
            runner,
            dir,
            logger,
        }
    }

    /// Replace the process environment as a variable source
    pub fn with_environment(mut self, source: impl Fn() -> Vars + Send + Sync + 'static) -> Self {
        self.resolver = self.resolver.with_environment(source);
        self
    }

    pub fn taskfile(&self) -> &Taskfile {
        &self.taskfile
    }

    pub fn resolver(&self) -> &Resolver<Arc<Taskfile>> {
        &self.resolver
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run a task and every task it calls
    pub fn run(&self, call: &Call) -> Result<()> {
        let mut ctx = Context::new();
        self.run_call(call, &mut ctx)
    }

    fn run_call(&self, call: &Call, ctx: &mut Context) -> Result<()> {
        // Check for recursion
        if ctx.is_task_in_stack(&call.task) {
            ctx.push_task(call.task.clone());
            return Err(ConfigError::RecursiveCall(call.task.clone(), ctx.describe_stack()).into());
        }

        let task = self
            .taskfile
            .tasks
            .get(&call.task)
            .ok_or_else(|| ConfigError::TaskNotFound(call.task.clone()))?;

        ctx.push_task(call.task.clone());
        self.logger.print_task_start(&call.task);
        let result = self.execute(task, call, ctx);
        ctx.pop_task();

        if result.is_ok() {
            self.logger.print_task_complete(&call.task);
        }
        result
    }

    fn execute(&self, task: &Task, call: &Call, ctx: &mut Context) -> Result<()> {
        let resolved = Call {
            task: call.task.clone(),
            vars: self.resolver.resolve_variables(call)?,
        };

        let dir = match &task.dir {
            Some(dir) => self.dir.join(self.resolver.substitute(dir, &resolved)?),
            None => self.dir.clone(),
        };

        let texts: Vec<&str> = task.cmds.iter().map(Cmd::text).collect();
        let rendered = self.resolver.substitute_all(&texts, &resolved)?;

        for (cmd, text) in task.cmds.iter().zip(rendered) {
            match cmd {
                Cmd::Command(_) => {
                    if !task.silent {
                        self.logger.print_run(&text);
                    }
                    self.runner
                        .run(RunOptions::new(&text, &dir))
                        .map_err(Error::Execution)?;
                }
                Cmd::Task(sub) => {
                    let sub_call = Call {
                        task: text,
                        vars: self.render_overrides(&sub.vars, &resolved)?,
                    };
                    self.run_call(&sub_call, ctx)?;
                }
            }
        }

        Ok(())
    }

    /// Render a task call's overrides with the caller's variables
    fn render_overrides(&self, vars: &Vars, resolved: &Call) -> Result<Vars> {
        vars.iter()
            .map(|(name, var)| {
                let rendered = match var {
                    Var::Literal(text) => Var::Literal(self.resolver.substitute(text, resolved)?),
                    Var::Shell(command) => Var::Shell(self.resolver.substitute(command, resolved)?),
                };
                Ok((name.clone(), rendered))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::error::{ExecutionError, ExecutionResult, VariableError};
    use crate::runner::Verbosity;
    use std::io::Write;
    use std::sync::Mutex;

    /// Records what would run, and where
    #[derive(Default)]
    struct RecordingRunner {
        ran: Mutex<Vec<(String, PathBuf)>>,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, opts: RunOptions<'_>) -> ExecutionResult<()> {
            self.ran
                .lock()
                .unwrap()
                .push((opts.command.to_string(), opts.dir.to_path_buf()));
            if opts.command == "fail" {
                return Err(ExecutionError::CommandFailed(Some(1)));
            }
            if let Some(stdout) = opts.stdout {
                stdout
                    .write_all(format!("sh:{}\n", opts.command).as_bytes())
                    .map_err(ExecutionError::Io)?;
            }
            Ok(())
        }
    }

    fn executor(yaml: &str) -> (Executor, Arc<RecordingRunner>) {
        let runner = Arc::new(RecordingRunner::default());
        let executor = Executor::with_runner(
            parse_config(yaml).unwrap(),
            "/work",
            Logger::new(Verbosity::Silent),
            runner.clone(),
        )
        .with_environment(Vars::new);
        (executor, runner)
    }

    fn commands(runner: &RecordingRunner) -> Vec<String> {
        runner.ran.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    #[test]
    fn test_commands_are_rendered_with_resolved_vars() {
        let (executor, runner) = executor(
            r#"
vars:
  NAME: app
tasks:
  build:
    vars:
      VERSION: "$describe"
      BIN: "{{.NAME}}-bin"
    cmds:
      - echo {{.NAME}} {{.VERSION}}
      - cp {{.BIN}} out
"#,
        );
        executor.run(&Call::new("build")).unwrap();
        assert_eq!(
            commands(&runner),
            vec!["describe", "echo app sh:describe", "cp app-bin out"]
        );
    }

    #[test]
    fn test_dir_is_rendered_relative_to_root() {
        let (executor, runner) = executor(
            r#"
tasks:
  build:
    dir: "{{.SUB}}"
    vars:
      SUB: nested
    cmds: make
"#,
        );
        executor.run(&Call::new("build")).unwrap();
        let ran = runner.ran.lock().unwrap();
        assert_eq!(ran[0].1, PathBuf::from("/work/nested"));
    }

    #[test]
    fn test_task_call_passes_rendered_overrides() {
        let (executor, runner) = executor(
            r#"
tasks:
  main:
    vars:
      WHO: world
    cmds:
      - task: greet
        vars:
          TARGET: "{{.WHO}}"
  greet:
    vars:
      TARGET: nobody
    cmds: echo hello {{.TARGET}}
"#,
        );
        executor.run(&Call::new("main")).unwrap();
        assert_eq!(commands(&runner), vec!["echo hello world"]);
    }

    #[test]
    fn test_call_overrides_win() {
        let (executor, runner) = executor(
            r#"
tasks:
  greet:
    vars:
      TARGET: nobody
    cmds: echo {{.TARGET}}
"#,
        );
        let call = Call::new("greet").with_var("TARGET", Var::literal("cli"));
        executor.run(&call).unwrap();
        assert_eq!(commands(&runner), vec!["echo cli"]);
    }

    #[test]
    fn test_dynamic_vars_run_once_across_tasks() {
        let (executor, runner) = executor(
            r#"
vars:
  REV: "$git rev-parse HEAD"
tasks:
  a:
    cmds:
      - echo {{.REV}}
      - task: b
  b:
    cmds: echo {{.REV}}
"#,
        );
        executor.run(&Call::new("a")).unwrap();
        let ran = commands(&runner);
        assert_eq!(ran.iter().filter(|c| *c == "git rev-parse HEAD").count(), 1);
        assert_eq!(executor.resolver().evaluator().cache().len(), 1);
    }

    #[test]
    fn test_failure_stops_the_task() {
        let (executor, runner) = executor(
            r#"
tasks:
  build:
    cmds:
      - fail
      - never
"#,
        );
        let err = executor.run(&Call::new("build")).unwrap_err();
        assert!(matches!(err, Error::Execution(ExecutionError::CommandFailed(Some(1)))));
        assert_eq!(commands(&runner), vec!["fail"]);
    }

    #[test]
    fn test_template_error_runs_nothing() {
        let (executor, runner) = executor(
            r#"
tasks:
  build:
    cmds:
      - echo {{OS}}
      - echo {{nope}}
"#,
        );
        let err = executor.run(&Call::new("build")).unwrap_err();
        assert!(matches!(err, Error::Variable(VariableError::Template(_))));
        assert!(commands(&runner).is_empty());
    }

    #[test]
    fn test_multiline_variable_fails_the_task() {
        let yaml = r#"
tasks:
  build:
    vars:
      LINES: "$printf 'a\nb\n'"
    cmds: echo {{.LINES}}
"#;
        struct Multiline;
        impl CommandRunner for Multiline {
            fn run(&self, opts: RunOptions<'_>) -> ExecutionResult<()> {
                if let Some(stdout) = opts.stdout {
                    stdout.write_all(b"a\nb\n").map_err(ExecutionError::Io)?;
                }
                Ok(())
            }
        }
        let executor = Executor::with_runner(
            parse_config(yaml).unwrap(),
            "/work",
            Logger::new(Verbosity::Silent),
            Arc::new(Multiline),
        )
        .with_environment(Vars::new);
        let err = executor.run(&Call::new("build")).unwrap_err();
        assert!(matches!(
            err,
            Error::Variable(VariableError::MultilineResult { .. })
        ));
    }

    #[test]
    fn test_recursive_call_is_rejected() {
        let (executor, _) = executor(
            r#"
tasks:
  loop:
    cmds:
      - task: "{{.NEXT}}"
    vars:
      NEXT: loop
"#,
        );
        let err = executor.run(&Call::new("loop")).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::RecursiveCall(name, stack))
                if name == "loop" && stack == "loop -> loop"
        ));
    }

    #[test]
    fn test_unknown_task() {
        let (executor, _) = executor("tasks: {}");
        let err = executor.run(&Call::new("missing")).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::TaskNotFound(_))));
    }
}
