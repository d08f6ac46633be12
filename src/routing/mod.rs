//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate prefix conditions)
//!     → Return: matched RouteRule or None (static/SPA fallback)
//!
//! Route Compilation (at startup):
//!     RouteRule[]
//!     → Compile prefix matchers
//!     → Sort by prefix length, longest first
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: longest matching prefix wins, declaration order breaks nothing

pub mod matcher;
pub mod router;

pub use matcher::{Matcher, PathPrefixMatcher};
pub use router::Router;
