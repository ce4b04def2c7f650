//! Process environment as a variable source

use crate::vars::{Var, Vars};
use std::env;

/// Split a `KEY=VALUE` entry on its first `=`
///
/// Returns `None` when the entry has no `=` at all.
pub fn split_entry(entry: &str) -> Option<(&str, &str)> {
    entry.split_once('=')
}

/// Build a variable set from `KEY=VALUE` entries
///
/// Entries without `=` are skipped. Later entries overwrite earlier ones.
pub fn from_entries<I, S>(entries: I) -> Vars
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .filter_map(|entry| {
            split_entry(entry.as_ref()).map(|(k, v)| (k.to_string(), Var::literal(v)))
        })
        .collect()
}

/// Capture the current process environment as literal variables
pub fn snapshot() -> Vars {
    env::vars_os()
        .map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                Var::Literal(v.to_string_lossy().into_owned()),
            )
        })
        .collect()
}
