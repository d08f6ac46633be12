//! Configuration loading from disk and the environment.
//!
//! Precedence, highest first: command-line overrides, process environment,
//! `.env` files, the TOML config file, built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::env::{load_env_files, merge_process_env, process_env, EnvVars};
use crate::config::schema::{
    AliasEntry, AliasRule, FileConfig, RouteRule, ServerConfig, DEFAULT_ALIASES, DEFAULT_PROXY_PREFIXES,
};
use crate::config::validation::{validate_config, ValidationError};

/// Upstream base URL for every proxied prefix.
pub const API_BASE_URL_VAR: &str = "VITE_API_BASE_URL";

/// Listen port.
pub const DEV_PORT_VAR: &str = "VITE_DEV_PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read env file {}: {source}", .path.display())]
    Env {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("no upstream for route {prefix:?}: set VITE_API_BASE_URL or upstream.base_url")]
    MissingUpstream { prefix: String },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inputs gathered from the command line.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Project root; alias and static targets are relative to it.
    pub root: PathBuf,
    /// Selects `.env.<mode>` files.
    pub mode: String,
    /// Optional TOML config file.
    pub config_path: Option<PathBuf>,
    /// Port override, wins over every other source.
    pub port: Option<u16>,
    /// Force binding to localhost only.
    pub local_only: bool,
}

impl LoadOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mode: "development".to_string(),
            config_path: None,
            port: None,
            local_only: false,
        }
    }
}

/// Parse a TOML config file.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load, merge and validate configuration from every source.
pub fn load(options: &LoadOptions) -> Result<ServerConfig, ConfigError> {
    let root = absolute_root(&options.root)?;

    let file = match &options.config_path {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };

    let env = merge_process_env(load_env_files(&root, &options.mode)?, process_env());

    let mut config = build_config(&root, file, &env)?;
    if let Some(port) = options.port {
        config.listener.port = port;
    }
    if options.local_only {
        config.listener.bind_all_interfaces = false;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Combine the file layer with environment variables into a [`ServerConfig`].
///
/// The result is not validated.
pub fn build_config(root: &Path, file: FileConfig, env: &EnvVars) -> Result<ServerConfig, ConfigError> {
    let mut listener = file.listener;
    listener.port = resolve_port(env.get(DEV_PORT_VAR).map(String::as_str), listener.port);

    let base_url = [env.get(API_BASE_URL_VAR), file.upstream.base_url.as_ref()]
        .into_iter()
        .flatten()
        .map(|url| url.trim())
        .find(|url| !url.is_empty())
        .map(str::to_string);

    let defaults = &file.upstream;
    let routes = if file.routes.is_empty() {
        DEFAULT_PROXY_PREFIXES
            .iter()
            .map(|prefix| {
                let upstream = base_url.clone().ok_or_else(|| ConfigError::MissingUpstream {
                    prefix: prefix.to_string(),
                })?;
                Ok(RouteRule {
                    path_prefix: prefix.to_string(),
                    upstream_base_url: upstream,
                    rewrite_origin: defaults.rewrite_origin,
                    verify_tls: defaults.verify_tls,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?
    } else {
        file.routes
            .into_iter()
            .map(|entry| {
                let upstream = entry
                    .upstream
                    .or_else(|| base_url.clone())
                    .ok_or_else(|| ConfigError::MissingUpstream {
                        prefix: entry.path_prefix.clone(),
                    })?;
                Ok(RouteRule {
                    path_prefix: entry.path_prefix,
                    upstream_base_url: upstream,
                    rewrite_origin: entry.rewrite_origin.unwrap_or(defaults.rewrite_origin),
                    verify_tls: entry.verify_tls.unwrap_or(defaults.verify_tls),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?
    };

    let aliases = build_aliases(root, file.aliases);

    let mut static_files = file.static_files;
    static_files.root = root.join(&static_files.root);

    Ok(ServerConfig {
        listener,
        base_path: file.base_path.unwrap_or_else(|| "/".to_string()),
        routes,
        aliases,
        timeouts: file.timeouts,
        static_files,
        observability: file.observability,
    })
}

/// Alias rules from the file layer, or the built-in set when it has none.
pub fn build_aliases(root: &Path, entries: Vec<AliasEntry>) -> Vec<AliasRule> {
    if entries.is_empty() {
        DEFAULT_ALIASES
            .iter()
            .map(|(symbol, target)| AliasRule::new(*symbol, root.join(target)))
            .collect()
    } else {
        entries
            .into_iter()
            .map(|entry| AliasRule::new(entry.symbol, root.join(entry.target)))
            .collect()
    }
}

/// Load only the alias rules. The upstream does not need to be configured.
pub fn load_aliases(options: &LoadOptions) -> Result<Vec<AliasRule>, ConfigError> {
    let root = absolute_root(&options.root)?;
    let file = match &options.config_path {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };
    Ok(build_aliases(&root, file.aliases))
}

/// Parse a port value, keeping `fallback` when it is missing, unparsable or zero.
pub fn resolve_port(raw: Option<&str>, fallback: u16) -> u16 {
    let Some(raw) = raw else {
        return fallback;
    };

    match raw.trim().parse::<u16>() {
        Ok(port) if port != 0 => port,
        _ => {
            tracing::warn!(
                variable = DEV_PORT_VAR,
                value = %raw,
                fallback,
                "Ignoring invalid port"
            );
            fallback
        }
    }
}

fn absolute_root(root: &Path) -> Result<PathBuf, ConfigError> {
    if root.is_absolute() {
        return Ok(root.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(root))
        .map_err(|source| ConfigError::Io {
            path: root.to_path_buf(),
            source,
        })
}
