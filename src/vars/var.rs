//! Variable values and their YAML decoding rules

use crate::error::{VariableError, VariableResult};
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::collections::HashMap;

/// Prefix marking a scalar as a shell command (`x: "$date +%F"`)
const SHELL_PREFIX: char = '$';

/// Key of the explicit shell form (`x: {sh: "date +%F"}`)
const SHELL_KEY: &str = "sh";

/// A variable value: either known up front or produced by a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Var {
    /// Literal, already-resolved value
    Literal(String),

    /// Command whose standard output becomes the value
    Shell(String),
}

/// Variable name to value
pub type Vars = HashMap<String, Var>;

impl Var {
    /// Create a literal value
    pub fn literal(value: impl Into<String>) -> Self {
        Var::Literal(value.into())
    }

    /// Create a shell-backed value
    pub fn shell(command: impl Into<String>) -> Self {
        Var::Shell(command.into())
    }

    /// The literal text, if this value needs no evaluation
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Var::Literal(value) => Some(value),
            Var::Shell(_) => None,
        }
    }

    /// Whether evaluating this value runs a command
    pub fn is_shell(&self) -> bool {
        matches!(self, Var::Shell(_))
    }

    /// Decode a variable from a generic YAML node
    ///
    /// Accepts a plain string (a leading `$` turns the rest into a command)
    /// or a mapping with the single key `sh`. Anything else is rejected.
    pub fn from_value(value: &Value) -> VariableResult<Self> {
        match value {
            Value::String(s) => Ok(match s.strip_prefix(SHELL_PREFIX) {
                Some(command) => Var::Shell(command.to_string()),
                None => Var::Literal(s.clone()),
            }),
            Value::Mapping(map) if map.len() == 1 => match map.get(SHELL_KEY) {
                Some(Value::String(command)) => Ok(Var::Shell(command.clone())),
                Some(_) => Err(VariableError::Malformed(
                    "`sh` must be a string".to_string(),
                )),
                None => Err(VariableError::Malformed(format!(
                    "expected a string or a mapping with `{}`",
                    SHELL_KEY
                ))),
            },
            other => Err(VariableError::Malformed(format!(
                "expected a string or a mapping with `{}`, got {}",
                SHELL_KEY,
                describe(other)
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Var {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;
        Var::from_value(&value).map_err(D::Error::custom)
    }
}

/// Flatten a variable set into the template context, keeping literals only
pub fn to_string_map(vars: &Vars) -> HashMap<String, String> {
    vars.iter()
        .filter_map(|(k, v)| v.as_literal().map(|s| (k.clone(), s.to_string())))
        .collect()
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(yaml: &str) -> Result<Var, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    #[test]
    fn test_decode_literal() {
        assert_eq!(decode("hello").unwrap(), Var::literal("hello"));
    }

    #[test]
    fn test_decode_shell_shorthand() {
        assert_eq!(decode(r#""$echo hi""#).unwrap(), Var::shell("echo hi"));
    }

    #[test]
    fn test_decode_shell_shorthand_strips_one_dollar() {
        assert_eq!(decode(r#""$$HOME""#).unwrap(), Var::shell("$HOME"));
    }

    #[test]
    fn test_decode_explicit_shell() {
        assert_eq!(decode(r#"{sh: "echo hi"}"#).unwrap(), Var::shell("echo hi"));
    }

    #[test]
    fn test_decode_explicit_shell_keeps_dollar() {
        assert_eq!(decode(r#"{sh: "$HOME"}"#).unwrap(), Var::shell("$HOME"));
    }

    #[test]
    fn test_decode_rejects_list() {
        let err = decode("[a, b]").unwrap_err();
        assert!(err.to_string().contains("can't unmarshal var value"));
    }

    #[test]
    fn test_decode_rejects_number() {
        assert!(decode("42").is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_mapping() {
        assert!(decode("{cmd: ls}").is_err());
        assert!(decode(r#"{sh: "ls", extra: 1}"#).is_err());
        assert!(decode("{sh: [ls]}").is_err());
    }

    #[test]
    fn test_from_value_reports_malformed() {
        let result = Var::from_value(&Value::Bool(true));
        assert!(matches!(result, Err(VariableError::Malformed(_))));
    }

    #[test]
    fn test_decode_vars_map() {
        let vars: Vars = serde_yaml::from_str(
            r#"
A: one
B: "$date"
C: {sh: uname}
"#,
        )
        .unwrap();
        assert_eq!(vars.len(), 3);
        assert_eq!(vars["A"], Var::literal("one"));
        assert!(vars["B"].is_shell());
        assert!(vars["C"].is_shell());
    }

    #[test]
    fn test_to_string_map_keeps_literals() {
        let mut vars = Vars::new();
        vars.insert("A".to_string(), Var::literal("1"));
        vars.insert("B".to_string(), Var::shell("echo 2"));

        let map = to_string_map(&vars);
        assert_eq!(map.get("A"), Some(&"1".to_string()));
        assert!(!map.contains_key("B"));
    }
}
