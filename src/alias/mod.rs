//! Import alias resolution.
//!
//! # Data Flow
//! ```text
//! AliasRule[] (from ServerConfig)
//!     → resolver.rs (sort by symbol length, longest first)
//!     → import specifier in, rewritten path out
//! ```
//!
//! # Design Decisions
//! - Textual prefix substitution on `/` segment boundaries, no regex
//! - Longest symbol wins regardless of declaration order
//! - Missing target directories are fatal to the build, never retried

pub mod resolver;

pub use resolver::{AliasResolver, ResolutionError};
