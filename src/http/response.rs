//! Header hygiene for relayed messages.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Strip headers the `Connection` header nominates
//!
//! # Design Decisions
//! - Everything else is relayed verbatim; no header is added to upstream responses
//! - Bodies are streamed, so `content-length` is kept as sent

use axum::http::header::{self, HeaderMap, HeaderName};

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let nominated: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in nominated {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}
