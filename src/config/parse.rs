//! Taskfile parsing and discovery

use crate::config::types::Taskfile;
use crate::error::{ConfigError, ConfigResult, Error};
use crate::vars::Vars;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default Taskfile names to search for
const CONFIG_FILE_NAMES: &[&str] = &["Taskfile.yml", "Taskfile.yaml"];

/// Optional global variable files next to the Taskfile
const TASKVARS_FILE_NAMES: &[&str] = &["Taskvars.yml", "Taskvars.yaml"];

/// Find the Taskfile by searching current and parent directories
pub fn find_config_file() -> ConfigResult<PathBuf> {
    find_config_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the Taskfile starting from a specific directory
pub fn find_config_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in CONFIG_FILE_NAMES {
            let config_path = current_dir.join(file_name);
            searched_paths.push(config_path.display().to_string());

            if config_path.is_file() {
                return Ok(config_path);
            }
        }

        // Try parent directory
        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => {
                // Reached root without finding a Taskfile
                return Err(ConfigError::NotFound(searched_paths.join(", ")));
            }
        }
    }
}

/// Parse a Taskfile from a path, merging a sibling Taskvars file into its globals
pub fn parse_config_file(path: &Path) -> Result<Taskfile, Error> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read file: {}", e)))?;

    let mut taskfile = parse_config(&contents)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    taskfile.vars.extend(load_taskvars(dir)?);
    Ok(taskfile)
}

/// Parse a Taskfile from a string
pub fn parse_config(yaml: &str) -> Result<Taskfile, Error> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Read global variables from `Taskvars.yml` in `dir`, if present
pub fn load_taskvars(dir: &Path) -> ConfigResult<Vars> {
    let Some(path) = TASKVARS_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
    else {
        return Ok(Vars::new());
    };

    let vars_file_error = |error: String| ConfigError::VarsFile {
        path: path.clone(),
        error,
    };
    let contents = fs::read_to_string(&path).map_err(|e| vars_file_error(e.to_string()))?;
    if contents.trim().is_empty() {
        return Ok(Vars::new());
    }
    serde_yaml::from_str(&contents).map_err(|e| vars_file_error(e.to_string()))
}

/// Parse the Taskfile with automatic file discovery
pub fn parse_config_auto() -> Result<(Taskfile, PathBuf), Error> {
    let config_path = find_config_file()?;
    let taskfile = parse_config_file(&config_path)?;
    Ok((taskfile, config_path))
}
