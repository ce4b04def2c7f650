//! `{{ }}` templating over a flat string context
//!
//! Templates use Go `text/template` syntax through `gtmpl`: context entries
//! are `{{.NAME}}`, functions are called as `{{OS}}` or piped into as
//! `{{.V | trimPrefix "v"}}`, and `if`/`range`/`with` work as usual. A
//! name missing from the context renders the empty string, as a missing
//! `map[string]string` key does.

pub mod funcs;

use crate::error::{TemplateError, TemplateResult};
use gtmpl::{Context, Value};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

pub use funcs::functions;

/// `.NAME` references, used to default missing names to ""
const FIELD_PATTERN: &str = r"\.([A-Za-z_][A-Za-z0-9_]*)";

fn field_pattern() -> Result<&'static Regex, String> {
    static FIELD: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    FIELD
        .get_or_init(|| Regex::new(FIELD_PATTERN))
        .as_ref()
        .map_err(|e| e.to_string())
}

/// A parsed template, reusable across contexts
pub struct Template {
    source: String,
    inner: gtmpl::Template,
}

impl Template {
    /// Parse `source` with the task functions registered
    pub fn parse(source: &str) -> TemplateResult<Self> {
        let mut inner = gtmpl::Template::default();
        for (name, func) in functions() {
            inner.add_func(name, func);
        }
        inner.parse(source).map_err(|e| TemplateError::Syntax {
            template: source.to_string(),
            message: e.to_string(),
        })?;

        Ok(Template {
            source: source.to_string(),
            inner,
        })
    }

    /// Render against `ctx`
    pub fn execute(&self, ctx: &HashMap<String, String>) -> TemplateResult<String> {
        let exec_error = |message: String| TemplateError::Exec {
            template: self.source.clone(),
            message,
        };

        let mut data: HashMap<String, Value> = field_pattern()
            .map_err(exec_error)?
            .captures_iter(&self.source)
            .map(|caps| (caps[1].to_string(), Value::String(String::new())))
            .collect();
        data.extend(
            ctx.iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone()))),
        );

        self.inner
            .render(&Context::from(Value::from(data)))
            .map_err(|e| exec_error(e.to_string()))
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Parse and render a single template
pub fn substitute(template: &str, ctx: &HashMap<String, String>) -> TemplateResult<String> {
    Template::parse(template)?.execute(ctx)
}

/// Render each template in order, stopping at the first failure
pub fn substitute_all<S: AsRef<str>>(
    templates: &[S],
    ctx: &HashMap<String, String>,
) -> TemplateResult<Vec<String>> {
    templates
        .iter()
        .map(|t| substitute(t.as_ref(), ctx))
        .collect()
}
