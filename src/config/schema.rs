//! Configuration schema definitions.
//!
//! Two layers live here:
//! - [`FileConfig`], the optional TOML file as written by an operator (every
//!   field defaulted, rule sets optional);
//! - [`ServerConfig`], the resolved and validated configuration the server
//!   runs with. It is built once at startup and never mutated.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Path prefixes forwarded to the API upstream when no `[[routes]]` are configured.
pub const DEFAULT_PROXY_PREFIXES: &[&str] = &[
    "/event",
    "/volunter",
    "/resident",
    "/user/login",
    "/smartvillage",
    "/village",
    "/contact",
    "/view",
    "/join-community-by-coordinates",
    "/locate",
    "/me",
    "/leaders",
    "/place",
    "/participations/",
];

/// Import aliases used when no `[[aliases]]` are configured.
///
/// Targets are relative to the project root. `@/components/ui` deliberately
/// shares the `@/components` target; existing imports rely on it.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("@", "src"),
    ("@/components", "src/components"),
    ("@/components/ui", "src/components"),
    ("@/lib", "src/lib"),
    ("@/hooks", "src/hooks"),
    ("@/utils", "src/lib/utils"),
];

/// Resolved configuration for the dev server.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// Listener configuration (port, interfaces).
    pub listener: ListenerConfig,

    /// Public path every asset is served under.
    pub base_path: String,

    /// Proxy rules in declaration order.
    pub routes: Vec<RouteRule>,

    /// Import aliases in declaration order.
    pub aliases: Vec<AliasRule>,

    /// Upstream timeouts.
    pub timeouts: TimeoutConfig,

    /// Static asset serving for unproxied paths.
    pub static_files: StaticFilesConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// A single proxied path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRule {
    /// Case-sensitive request path prefix, always starting with `/`.
    pub path_prefix: String,

    /// Absolute base URL the request path is appended to.
    pub upstream_base_url: String,

    /// Rewrite `Host` and `Origin` to the upstream authority.
    pub rewrite_origin: bool,

    /// Validate upstream TLS certificates.
    pub verify_tls: bool,
}

impl RouteRule {
    /// Rule with origin rewriting and TLS verification enabled.
    pub fn new(path_prefix: impl Into<String>, upstream_base_url: impl Into<String>) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            upstream_base_url: upstream_base_url.into(),
            rewrite_origin: true,
            verify_tls: true,
        }
    }
}

/// A symbolic import prefix and the directory it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasRule {
    pub symbol: String,
    pub target_directory: PathBuf,
}

impl AliasRule {
    pub fn new(symbol: impl Into<String>, target_directory: impl Into<PathBuf>) -> Self {
        Self {
            symbol: symbol.into(),
            target_directory: target_directory.into(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// TCP port (1-65535).
    pub port: u16,

    /// Bind `0.0.0.0` instead of `127.0.0.1`.
    pub bind_all_interfaces: bool,
}

impl ListenerConfig {
    /// Socket address to bind.
    pub fn socket_addr(&self) -> SocketAddr {
        let ip = if self.bind_all_interfaces {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        };
        SocketAddr::new(ip, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_all_interfaces: true,
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to answer with a status line, in seconds.
    pub response_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 30,
            response_secs: 30,
        }
    }
}

/// Static asset serving for requests no proxy rule claims.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory holding the built application, relative to the project root.
    pub root: PathBuf,

    /// Entry document served for extensionless paths.
    pub index: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("dist"),
            index: "index.html".to_string(),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Root of the optional TOML config file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub base_path: Option<String>,
    pub listener: ListenerConfig,
    pub upstream: UpstreamDefaults,

    /// Replaces [`DEFAULT_PROXY_PREFIXES`] when non-empty.
    pub routes: Vec<RouteEntry>,

    /// Replaces [`DEFAULT_ALIASES`] when non-empty.
    pub aliases: Vec<AliasEntry>,

    pub timeouts: TimeoutConfig,
    pub static_files: StaticFilesConfig,
    pub observability: ObservabilityConfig,
}

/// Settings shared by every route that does not override them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamDefaults {
    /// Fallback when `VITE_API_BASE_URL` is not set.
    pub base_url: Option<String>,
    pub rewrite_origin: bool,
    pub verify_tls: bool,
}

impl Default for UpstreamDefaults {
    fn default() -> Self {
        Self {
            base_url: None,
            rewrite_origin: true,
            verify_tls: true,
        }
    }
}

/// A `[[routes]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteEntry {
    pub path_prefix: String,
    pub upstream: Option<String>,
    pub rewrite_origin: Option<bool>,
    pub verify_tls: Option<bool>,
}

/// An `[[aliases]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct AliasEntry {
    pub symbol: String,
    /// Directory relative to the project root, or absolute.
    pub target: PathBuf,
}
