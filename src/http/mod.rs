//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → routing layer decides: proxy rule or no match
//!     → upstream.rs (relay to the API upstream, stream back)
//!     → fallback.rs (static assets, SPA entry document)
//!     → response.rs (hop-by-hop header hygiene)
//!     → Send to client
//! ```

pub mod fallback;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::{RequestIdGenerator, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
pub use upstream::{ProxyUpstreamError, UpstreamClient};
