//! Per-invocation variable resolution
//!
//! Four sources are merged in order, later ones winning on name clashes:
//!
//! 1. global declarations, used verbatim
//! 2. the task's own declarations, templated against phase 1
//! 3. the process environment, used verbatim
//! 4. the caller's overrides, used verbatim
//!
//! Only task-local declarations go through the template engine, so
//! environment content and caller input are never reinterpreted as
//! template syntax. Every entry leaves resolution as a literal.

use crate::error::{VariableError, VariableResult};
use crate::vars::template::{self, Template};
use crate::vars::{env, to_string_map, DynamicEvaluator, Var, Vars};
use std::collections::HashMap;
use std::sync::Arc;

/// Where task-local declarations come from
pub trait TaskStore: Send + Sync {
    /// Declarations of `task`, or `None` if no such task exists
    fn task_vars(&self, task: &str) -> Option<&Vars>;
}

impl TaskStore for HashMap<String, Vars> {
    fn task_vars(&self, task: &str) -> Option<&Vars> {
        self.get(task)
    }
}

impl<T: TaskStore + ?Sized> TaskStore for Arc<T> {
    fn task_vars(&self, task: &str) -> Option<&Vars> {
        (**self).task_vars(task)
    }
}

/// One request to run a task, with the caller's overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Call {
    pub task: String,
    pub vars: Vars,
}

impl Call {
    pub fn new(task: impl Into<String>) -> Self {
        Call {
            task: task.into(),
            vars: Vars::new(),
        }
    }

    /// Add an override
    pub fn with_var(mut self, name: impl Into<String>, value: Var) -> Self {
        self.vars.insert(name.into(), value);
        self
    }
}

type EnvironmentSource = Box<dyn Fn() -> Vars + Send + Sync>;

/// Builds the resolved variable set for each call
pub struct Resolver<S> {
    store: S,
    globals: Vars,
    evaluator: DynamicEvaluator,
    environment: EnvironmentSource,
}

impl<S: TaskStore> Resolver<S> {
    pub fn new(store: S, globals: Vars, evaluator: DynamicEvaluator) -> Self {
        Resolver {
            store,
            globals,
            evaluator,
            environment: Box::new(env::snapshot),
        }
    }

    /// Replace the process environment as the third source
    pub fn with_environment(mut self, source: impl Fn() -> Vars + Send + Sync + 'static) -> Self {
        self.environment = Box::new(source);
        self
    }

    pub fn evaluator(&self) -> &DynamicEvaluator {
        &self.evaluator
    }

    pub fn globals(&self) -> &Vars {
        &self.globals
    }

    /// Render `template` with the call's literal variables
    pub fn substitute(&self, template: &str, call: &Call) -> VariableResult<String> {
        Ok(template::substitute(template, &to_string_map(&call.vars))?)
    }

    /// Render each template with the call's literal variables
    ///
    /// Fails on the first error without returning partial output.
    pub fn substitute_all<T: AsRef<str>>(
        &self,
        templates: &[T],
        call: &Call,
    ) -> VariableResult<Vec<String>> {
        Ok(template::substitute_all(templates, &to_string_map(&call.vars))?)
    }

    /// Resolve every variable visible to `call`
    pub fn resolve_variables(&self, call: &Call) -> VariableResult<Vars> {
        let task_vars = self
            .store
            .task_vars(&call.task)
            .ok_or_else(|| VariableError::TaskNotFound(call.task.clone()))?;
        let environment = (self.environment)();

        let mut result = Vars::with_capacity(
            self.globals.len() + task_vars.len() + environment.len() + call.vars.len(),
        );
        self.merge(&mut result, &self.globals, false)?;
        self.merge(&mut result, task_vars, true)?;
        self.merge(&mut result, &environment, false)?;
        self.merge(&mut result, &call.vars, false)?;
        Ok(result)
    }

    fn merge(&self, result: &mut Vars, vars: &Vars, run_template: bool) -> VariableResult<()> {
        // Templates see the set as it stood before this phase, so the
        // outcome doesn't depend on iteration order within the phase.
        let ctx = run_template.then(|| to_string_map(result));

        let mut names: Vec<&String> = vars.keys().collect();
        names.sort();

        for name in names {
            let var = &vars[name];
            let value = match &ctx {
                Some(ctx) => self.evaluator.resolve(&render(var, ctx)?)?,
                None => self.evaluator.resolve(var)?,
            };
            result.insert(name.clone(), Var::Literal(value));
        }
        Ok(())
    }
}

/// Template a declaration's text, keeping its kind
fn render(var: &Var, ctx: &HashMap<String, String>) -> VariableResult<Var> {
    Ok(match var {
        Var::Literal(text) => Var::Literal(Template::parse(text)?.execute(ctx)?),
        Var::Shell(command) => Var::Shell(Template::parse(command)?.execute(ctx)?),
    })
}
