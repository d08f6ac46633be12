//! Environment variable sources.
//!
//! `.env` files are read from the project root in increasing priority:
//! `.env`, `.env.local`, `.env.<mode>`, `.env.<mode>.local`. Values already in
//! the process environment always win over file values. The process
//! environment itself is never modified.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;

use crate::config::loader::ConfigError;

/// Flattened environment the loader reads from.
pub type EnvVars = HashMap<String, String>;

/// Env file names for `mode`, lowest priority first.
pub fn env_file_names(mode: &str) -> [String; 4] {
    [
        ".env".to_string(),
        ".env.local".to_string(),
        format!(".env.{mode}"),
        format!(".env.{mode}.local"),
    ]
}

/// Read every env file present under `root` for `mode`.
pub fn load_env_files(root: &Path, mode: &str) -> Result<EnvVars, ConfigError> {
    let mut vars = EnvVars::new();

    for name in env_file_names(mode) {
        let path = root.join(&name);
        if !path.is_file() {
            continue;
        }

        let iter = dotenvy::from_path_iter(&path).map_err(|source| ConfigError::Env {
            path: path.clone(),
            source,
        })?;

        let mut count = 0usize;
        for item in iter {
            let (key, value) = item.map_err(|source| ConfigError::Env {
                path: path.clone(),
                source,
            })?;
            vars.insert(key, value);
            count += 1;
        }

        tracing::debug!(file = %path.display(), variables = count, "Loaded env file");
    }

    Ok(vars)
}

/// Overlay `process` on top of `files`.
pub fn merge_process_env<I>(mut files: EnvVars, process: I) -> EnvVars
where
    I: IntoIterator<Item = (String, String)>,
{
    files.extend(process);
    files
}

/// Process environment entries whose name and value are both UTF-8.
///
/// Other entries are skipped; none of the variables read here can hold them.
pub fn process_env() -> impl Iterator<Item = (String, String)> {
    utf8_vars(std::env::vars_os())
}

fn utf8_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter().filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
        (Ok(key), Ok(value)) => Some((key, value)),
        (key, _) => {
            tracing::debug!(variable = ?key, "Skipping non UTF-8 environment entry");
            None
        }
    })
}
