//! Configuration validation.
//!
//! Semantic checks run after serde and the environment merge. Every violation
//! is collected so an operator sees the whole list at once.

use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::config::schema::ServerConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener port must be between 1 and 65535")]
    InvalidPort,

    #[error("base path {0:?} must begin and end with '/'")]
    InvalidBasePath(String),

    #[error("route prefix {0:?} must be non-empty and begin with '/'")]
    InvalidPrefix(String),

    #[error("route prefix {0:?} is declared more than once")]
    DuplicatePrefix(String),

    #[error("route {prefix:?} has invalid upstream {url:?}: {reason}")]
    InvalidUpstream {
        prefix: String,
        url: String,
        reason: String,
    },

    #[error("alias symbol must not be empty")]
    EmptyAliasSymbol,

    #[error("alias {0:?} is declared more than once")]
    DuplicateAlias(String),

    #[error("alias {symbol:?} target {} is not an absolute path", .target.display())]
    RelativeAliasTarget { symbol: String, target: PathBuf },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a resolved configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }

    if !config.base_path.starts_with('/') || !config.base_path.ends_with('/') {
        errors.push(ValidationError::InvalidBasePath(config.base_path.clone()));
    }

    let mut prefixes = HashSet::new();
    for route in &config.routes {
        if !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPrefix(route.path_prefix.clone()));
        }
        if !prefixes.insert(route.path_prefix.as_str()) {
            errors.push(ValidationError::DuplicatePrefix(route.path_prefix.clone()));
        }
        if let Err(reason) = check_upstream(&route.upstream_base_url) {
            errors.push(ValidationError::InvalidUpstream {
                prefix: route.path_prefix.clone(),
                url: route.upstream_base_url.clone(),
                reason,
            });
        }
    }

    let mut symbols = HashSet::new();
    for alias in &config.aliases {
        if alias.symbol.is_empty() {
            errors.push(ValidationError::EmptyAliasSymbol);
        } else if !symbols.insert(alias.symbol.as_str()) {
            errors.push(ValidationError::DuplicateAlias(alias.symbol.clone()));
        }
        if !alias.target_directory.is_absolute() {
            errors.push(ValidationError::RelativeAliasTarget {
                symbol: alias.symbol.clone(),
                target: alias.target_directory.clone(),
            });
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.response_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("response_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_upstream(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {:?}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{
        AliasRule, ListenerConfig, ObservabilityConfig, RouteRule, StaticFilesConfig, TimeoutConfig,
    };

    fn config() -> ServerConfig {
        ServerConfig {
            listener: ListenerConfig::default(),
            base_path: "/".into(),
            routes: vec![
                RouteRule::new("/village", "https://api.example.com"),
                RouteRule::new("/event", "http://127.0.0.1:8000/api"),
            ],
            aliases: vec![AliasRule::new("@", "/app/src"), AliasRule::new("@/lib", "/app/src/lib")],
            timeouts: TimeoutConfig::default(),
            static_files: StaticFilesConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert_eq!(validate_config(&config()), Ok(()));
    }

    #[test]
    fn test_duplicate_and_malformed_prefixes() {
        let mut c = config();
        c.routes.push(RouteRule::new("/village", "https://api.example.com"));
        c.routes.push(RouteRule::new("", "https://api.example.com"));
        c.routes.push(RouteRule::new("place", "https://api.example.com"));

        let errors = validate_config(&c).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicatePrefix("/village".into())));
        assert!(errors.contains(&ValidationError::InvalidPrefix("".into())));
        assert!(errors.contains(&ValidationError::InvalidPrefix("place".into())));
    }

    #[test]
    fn test_upstream_must_be_absolute_http_url() {
        let mut c = config();
        c.routes = vec![
            RouteRule::new("/a", "api.example.com"),
            RouteRule::new("/b", "ftp://api.example.com"),
            RouteRule::new("/c", "https://api.example.com/?x=1"),
        ];

        let errors = validate_config(&c).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::InvalidUpstream { .. })));
    }

    #[test]
    fn test_alias_rules() {
        let mut c = config();
        c.aliases.push(AliasRule::new("@", "/elsewhere"));
        c.aliases.push(AliasRule::new("", "/app"));
        c.aliases.push(AliasRule::new("~", "relative/src"));

        let errors = validate_config(&c).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateAlias("@".into())));
        assert!(errors.contains(&ValidationError::EmptyAliasSymbol));
        assert!(errors.contains(&ValidationError::RelativeAliasTarget {
            symbol: "~".into(),
            target: PathBuf::from("relative/src"),
        }));
    }

    #[test]
    fn test_port_base_path_and_timeouts() {
        let mut c = config();
        c.listener.port = 0;
        c.base_path = "/app".into();
        c.timeouts.connect_secs = 0;
        c.timeouts.response_secs = 0;

        let errors = validate_config(&c).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidPort,
                ValidationError::InvalidBasePath("/app".into()),
                ValidationError::ZeroTimeout("connect_secs"),
                ValidationError::ZeroTimeout("response_secs"),
            ]
        );
    }
}
