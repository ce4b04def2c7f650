//! Functions registered on top of the `text/template` builtins

use gtmpl::{Func, FuncError, Value};
use regex::Regex;
use std::env;
use std::path::MAIN_SEPARATOR;

/// Longest string `repeat` may build
const MAX_REPEAT_LEN: usize = 10 * 1024 * 1024;

/// Task runner helpers and general string/list helpers, by name
///
/// `eq`, `ne`, `lt`, `and`, `or`, `not`, `len`, `index`, `print` and
/// `printf` come with the template engine itself.
pub fn functions() -> Vec<(&'static str, Func)> {
    vec![
        // Task runner helpers
        ("OS", os),
        ("ARCH", arch),
        ("IsSH", is_sh),
        ("FromSlash", from_slash),
        ("ToSlash", to_slash),
        ("ExeExt", exe_ext),
        // Strings
        ("upper", upper),
        ("lower", lower),
        ("title", title),
        ("trim", trim),
        ("trimPrefix", trim_prefix),
        ("trimSuffix", trim_suffix),
        ("replace", replace),
        ("contains", contains),
        ("hasPrefix", has_prefix),
        ("hasSuffix", has_suffix),
        ("repeat", repeat),
        ("default", default),
        ("quote", quote),
        ("squote", squote),
        // Lists
        ("splitList", split_list),
        ("join", join),
        ("list", list),
        // Misc
        ("env", env_var),
        ("regexMatch", regex_match),
        ("regexReplaceAll", regex_replace_all),
    ]
}

/// Render a value the way it prints in a template, missing values as ""
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::NoValue | Value::Nil => String::new(),
        other => other.to_string(),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::NoValue | Value::Nil => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(items) => items.is_empty(),
        Value::Map(map) | Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn exactly(name: &str, args: &[Value], n: usize) -> Result<(), FuncError> {
    if args.len() == n {
        Ok(())
    } else {
        Err(FuncError::ExactlyXArgs(name.to_string(), n))
    }
}

/// Check arity and render every argument as a string
fn strings<const N: usize>(name: &str, args: &[Value]) -> Result<[String; N], FuncError> {
    exactly(name, args, N)?;
    Ok(std::array::from_fn(|i| text(&args[i])))
}

fn string(s: impl Into<String>) -> Result<Value, FuncError> {
    Ok(Value::String(s.into()))
}

fn os(args: &[Value]) -> Result<Value, FuncError> {
    exactly("OS", args, 0)?;
    string(env::consts::OS)
}

fn arch(args: &[Value]) -> Result<Value, FuncError> {
    exactly("ARCH", args, 0)?;
    string(env::consts::ARCH)
}

// Kept for Taskfiles written before non-sh interpreters existed; always true.
fn is_sh(args: &[Value]) -> Result<Value, FuncError> {
    exactly("IsSH", args, 0)?;
    Ok(Value::Bool(true))
}

fn from_slash(args: &[Value]) -> Result<Value, FuncError> {
    let [path] = strings::<1>("FromSlash", args)?;
    if MAIN_SEPARATOR == '/' {
        string(path)
    } else {
        string(path.replace('/', &MAIN_SEPARATOR.to_string()))
    }
}

fn to_slash(args: &[Value]) -> Result<Value, FuncError> {
    let [path] = strings::<1>("ToSlash", args)?;
    if MAIN_SEPARATOR == '/' {
        string(path)
    } else {
        string(path.replace(MAIN_SEPARATOR, "/"))
    }
}

fn exe_ext(args: &[Value]) -> Result<Value, FuncError> {
    exactly("ExeExt", args, 0)?;
    string(env::consts::EXE_SUFFIX)
}

fn upper(args: &[Value]) -> Result<Value, FuncError> {
    let [s] = strings::<1>("upper", args)?;
    string(s.to_uppercase())
}

fn lower(args: &[Value]) -> Result<Value, FuncError> {
    let [s] = strings::<1>("lower", args)?;
    string(s.to_lowercase())
}

fn title(args: &[Value]) -> Result<Value, FuncError> {
    let [s] = strings::<1>("title", args)?;
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    string(out)
}

fn trim(args: &[Value]) -> Result<Value, FuncError> {
    let [s] = strings::<1>("trim", args)?;
    string(s.trim())
}

fn trim_prefix(args: &[Value]) -> Result<Value, FuncError> {
    let [prefix, s] = strings::<2>("trimPrefix", args)?;
    string(s.strip_prefix(prefix.as_str()).unwrap_or(&s))
}

fn trim_suffix(args: &[Value]) -> Result<Value, FuncError> {
    let [suffix, s] = strings::<2>("trimSuffix", args)?;
    string(s.strip_suffix(suffix.as_str()).unwrap_or(&s))
}

fn replace(args: &[Value]) -> Result<Value, FuncError> {
    let [old, new, s] = strings::<3>("replace", args)?;
    string(s.replace(&old, &new))
}

fn contains(args: &[Value]) -> Result<Value, FuncError> {
    let [substr, s] = strings::<2>("contains", args)?;
    Ok(Value::Bool(s.contains(&substr)))
}

fn has_prefix(args: &[Value]) -> Result<Value, FuncError> {
    let [prefix, s] = strings::<2>("hasPrefix", args)?;
    Ok(Value::Bool(s.starts_with(&prefix)))
}

fn has_suffix(args: &[Value]) -> Result<Value, FuncError> {
    let [suffix, s] = strings::<2>("hasSuffix", args)?;
    Ok(Value::Bool(s.ends_with(&suffix)))
}

/// `repeat COUNT STRING`, refusing results over [`MAX_REPEAT_LEN`]
fn repeat(args: &[Value]) -> Result<Value, FuncError> {
    exactly("repeat", args, 2)?;
    let count = match &args[0] {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .ok_or_else(|| FuncError::Generic("repeat count must be an integer".to_string()))?,
        other => text(other)
            .parse::<i64>()
            .map_err(|_| FuncError::Generic("repeat count must be an integer".to_string()))?,
    };
    let count = usize::try_from(count)
        .map_err(|_| FuncError::Generic("repeat count must be non-negative".to_string()))?;

    let s = text(&args[1]);
    match s.len().checked_mul(count) {
        Some(len) if len <= MAX_REPEAT_LEN => string(s.repeat(count)),
        _ => Err(FuncError::Generic(format!(
            "repeat result exceeds {} bytes",
            MAX_REPEAT_LEN
        ))),
    }
}

/// `default DEFAULT GIVEN`: GIVEN unless it is empty or missing
fn default(args: &[Value]) -> Result<Value, FuncError> {
    match args {
        [fallback] => Ok(fallback.clone()),
        [fallback, given] if is_empty(given) => Ok(fallback.clone()),
        [_, given] => Ok(given.clone()),
        _ => Err(FuncError::Generic(format!(
            "default takes 1 or 2 arguments, got {}",
            args.len()
        ))),
    }
}

fn quote_each(args: &[Value], quote: char) -> String {
    args.iter()
        .filter(|v| !matches!(v, Value::Nil | Value::NoValue))
        .map(|v| {
            let s = text(v);
            let mut out = String::with_capacity(s.len() + 2);
            out.push(quote);
            for c in s.chars() {
                if quote == '"' && (c == '"' || c == '\\') {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push(quote);
            out
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(args: &[Value]) -> Result<Value, FuncError> {
    string(quote_each(args, '"'))
}

fn squote(args: &[Value]) -> Result<Value, FuncError> {
    string(quote_each(args, '\''))
}

fn split_list(args: &[Value]) -> Result<Value, FuncError> {
    let [sep, s] = strings::<2>("splitList", args)?;
    Ok(Value::Array(
        s.split(sep.as_str())
            .map(|part| Value::String(part.to_string()))
            .collect(),
    ))
}

fn join(args: &[Value]) -> Result<Value, FuncError> {
    exactly("join", args, 2)?;
    let sep = text(&args[0]);
    match &args[1] {
        Value::Array(items) => string(items.iter().map(text).collect::<Vec<_>>().join(&sep)),
        other => string(text(other)),
    }
}

fn list(args: &[Value]) -> Result<Value, FuncError> {
    Ok(Value::Array(args.to_vec()))
}

fn env_var(args: &[Value]) -> Result<Value, FuncError> {
    let [name] = strings::<1>("env", args)?;
    string(env::var(name).unwrap_or_default())
}

fn compile(pattern: &str) -> Result<Regex, FuncError> {
    Regex::new(pattern)
        .map_err(|e| FuncError::Generic(format!("invalid regex {:?}: {}", pattern, e)))
}

fn regex_match(args: &[Value]) -> Result<Value, FuncError> {
    let [pattern, s] = strings::<2>("regexMatch", args)?;
    Ok(Value::Bool(compile(&pattern)?.is_match(&s)))
}

/// `regexReplaceAll REGEX INPUT REPLACEMENT`, `$1` style expansion
fn regex_replace_all(args: &[Value]) -> Result<Value, FuncError> {
    let [pattern, s, replacement] = strings::<3>("regexReplaceAll", args)?;
    string(compile(&pattern)?.replace_all(&s, replacement.as_str()))
}
