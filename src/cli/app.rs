//! Main CLI application

use crate::config::{find_config_file, parse_config_file, validate_config, Taskfile};
use crate::error::Result;
use crate::runner::{Executor, Logger, Verbosity};
use crate::vars::{env, Call, Var};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Task run when no task is named on the command line
pub const DEFAULT_TASK: &str = "default";

/// Build the clap command
fn build_command() -> Command {
    Command::new("vartask")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run tasks from a Taskfile, resolving their variables")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to the Taskfile (default: search upward for Taskfile.yml)"),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List tasks with their descriptions")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print command output and errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tasks")
                .value_name("TASK|KEY=VALUE")
                .help("Tasks to run, each optionally followed by KEY=VALUE overrides")
                .num_args(0..),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Group positional arguments into task calls
///
/// `KEY=VALUE` tokens become literal overrides of the task named before
/// them. Tokens ahead of every task name go to the first task, and with
/// no task named at all they go to `default`.
pub fn parse_calls(args: &[String]) -> Vec<Call> {
    let mut calls: Vec<Call> = Vec::new();
    let mut leading = Vec::new();

    for arg in args {
        match env::split_entry(arg) {
            Some((name, value)) => {
                let (name, var) = (name.to_string(), Var::literal(value));
                match calls.last_mut() {
                    Some(call) => {
                        call.vars.insert(name, var);
                    }
                    None => leading.push((name, var)),
                }
            }
            None => calls.push(Call::new(arg.clone())),
        }
    }

    if calls.is_empty() {
        calls.push(Call::new(DEFAULT_TASK));
    }
    for (name, var) in leading {
        calls[0].vars.entry(name).or_insert(var);
    }
    calls
}

/// Render the `--list` output
fn list_tasks(taskfile: &Taskfile) -> String {
    let mut names: Vec<&String> = taskfile.tasks.keys().collect();
    names.sort();

    let width = names.iter().map(|n| n.len()).max().unwrap_or(0);
    let mut out = String::from("Available tasks:\n");
    for name in names {
        let desc = taskfile.tasks[name].desc.as_deref().unwrap_or("");
        out.push_str(format!("* {:width$}  {}", name, desc).trim_end());
        out.push('\n');
    }
    out
}

/// Load and validate the Taskfile, returning it with its directory
fn load(file: Option<&PathBuf>) -> Result<(Taskfile, PathBuf)> {
    let path = match file {
        Some(path) => path.clone(),
        None => find_config_file()?,
    };
    let taskfile = parse_config_file(&path)?;
    validate_config(&taskfile)?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    Ok((taskfile, dir))
}

/// Run the CLI application with the given arguments
pub fn run_from<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().get_matches_from(args);
    let logger = Logger::new(get_verbosity(&matches));

    let (taskfile, dir) = load(matches.get_one::<PathBuf>("file"))?;

    if matches.get_flag("list") {
        print!("{}", list_tasks(&taskfile));
        return Ok(());
    }

    let args: Vec<String> = matches
        .get_many::<String>("tasks")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let executor = Executor::new(taskfile, dir, logger.clone());
    for call in parse_calls(&args) {
        if let Err(e) = executor.run(&call) {
            logger.print_error(&format!("task \"{}\" failed", call.task));
            return Err(e);
        }
    }
    Ok(())
}

/// Run the CLI application with the process arguments
pub fn run() -> Result<()> {
    run_from(std::env::args_os())
}
