//! Development front door for the Smart Village web application.
//!
//! Resolves import aliases for the build, forwards API path prefixes to the
//! backend, and serves the built application for everything else.

pub mod alias;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use alias::AliasResolver;
pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
