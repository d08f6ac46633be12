//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! devserver.toml (optional)  .env files  process env  CLI flags
//!     → loader.rs (parse, merge by precedence)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared via Arc with the router, resolver and fallback
//! ```
//!
//! # Design Decisions
//! - Config is built once at startup and never reloaded
//! - All file fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, load_aliases, ConfigError, LoadOptions};
pub use schema::{AliasRule, ListenerConfig, RouteRule, ServerConfig, TimeoutConfig};
