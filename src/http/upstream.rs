//! Upstream relay.
//!
//! # Responsibilities
//! - Build the upstream URL from the rule base and the original path/query
//! - Rewrite `Host` and `Origin` when the rule asks for it
//! - Apply the TLS verification policy per rule
//! - Stream the request body up and the response body back
//! - Map transport failures to gateway responses
//!
//! # Design Decisions
//! - No retries and no caching: one attempt, relayed verbatim
//! - Redirects are returned to the browser, never followed here
//! - The target is built as a raw `Uri`. Dot segments, percent escapes and
//!   query bytes reach the upstream exactly as the browser sent them
//! - Dropping the response future or body aborts the upstream request, so a
//!   client disconnect cancels the in-flight call

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::uri::{PathAndQuery, Uri};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper::body::Incoming;
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::{self, connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use url::Url;

use crate::config::{RouteRule, TimeoutConfig};
use crate::http::response::strip_hop_by_hop;

type HttpsClient = Client<HttpsConnector<HttpConnector>, Body>;

/// A proxied call failed before the upstream produced a response.
#[derive(Debug, Error)]
pub enum ProxyUpstreamError {
    /// Connection refused, DNS failure or TLS handshake failure.
    #[error("cannot connect to upstream {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: legacy::Error,
    },

    /// Connect or response deadline exceeded.
    #[error("upstream {url} did not respond within {}s", .after.as_secs())]
    Timeout { url: String, after: Duration },

    /// Any other transport or protocol error.
    #[error("upstream request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: legacy::Error,
    },

    #[error("invalid upstream url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ProxyUpstreamError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyUpstreamError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyUpstreamError {
    fn into_response(self) -> Response {
        let body = match &self {
            ProxyUpstreamError::Timeout { .. } => "Upstream timed out",
            _ => "Upstream request failed",
        };
        (self.status(), [(header::CONTENT_TYPE, "text/plain")], body).into_response()
    }
}

/// HTTP clients for proxied calls, one per TLS policy in use.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    verified: HttpsClient,
    insecure: Option<HttpsClient>,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl UpstreamClient {
    /// Build clients for `routes`. The certificate-skipping client only
    /// exists when some rule opts into it.
    pub fn new(routes: &[RouteRule], timeouts: &TimeoutConfig) -> Result<Self, native_tls::Error> {
        let connect_timeout = Duration::from_secs(timeouts.connect_secs);
        let response_timeout = Duration::from_secs(timeouts.response_secs);

        let verified = build_client(connect_timeout, true)?;

        let insecure_prefixes: Vec<&str> = routes
            .iter()
            .filter(|r| !r.verify_tls)
            .map(|r| r.path_prefix.as_str())
            .collect();
        let insecure = if insecure_prefixes.is_empty() {
            None
        } else {
            tracing::warn!(
                prefixes = ?insecure_prefixes,
                "TLS certificate verification disabled for these routes"
            );
            Some(build_client(connect_timeout, false)?)
        };

        Ok(Self {
            verified,
            insecure,
            connect_timeout,
            response_timeout,
        })
    }

    fn client_for(&self, rule: &RouteRule) -> &HttpsClient {
        match (&self.insecure, rule.verify_tls) {
            (Some(insecure), false) => insecure,
            _ => &self.verified,
        }
    }

    /// Relay `request` to the upstream named by `rule`.
    pub async fn forward(&self, rule: &RouteRule, request: Request<Body>) -> Result<Response, ProxyUpstreamError> {
        let (parts, body) = request.into_parts();

        let path_and_query = parts.uri.path_and_query().map(PathAndQuery::as_str).unwrap_or("/");
        let uri = upstream_uri(&rule.upstream_base_url, path_and_query)?;
        let target = uri.to_string();

        let origin = if rule.rewrite_origin {
            let base = Url::parse(&rule.upstream_base_url).map_err(|e| ProxyUpstreamError::InvalidUrl {
                url: rule.upstream_base_url.clone(),
                reason: e.to_string(),
            })?;
            Some(base)
        } else {
            None
        };

        let mut outbound = Request::new(body);
        *outbound.method_mut() = parts.method;
        *outbound.uri_mut() = uri;
        *outbound.headers_mut() = outbound_headers(&parts.headers, origin.as_ref());

        let upstream = match tokio::time::timeout(self.response_timeout, self.client_for(rule).request(outbound)).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => return Err(classify(target, source, self.connect_timeout)),
            Err(_) => {
                return Err(ProxyUpstreamError::Timeout {
                    url: target,
                    after: self.response_timeout,
                })
            }
        };

        Ok(relay_response(upstream))
    }
}

fn build_client(connect_timeout: Duration, verify_tls: bool) -> Result<HttpsClient, native_tls::Error> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));

    let mut tls = native_tls::TlsConnector::builder();
    if !verify_tls {
        tls.danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }
    let tls = tokio_native_tls::TlsConnector::from(tls.build()?);

    Ok(Client::builder(TokioExecutor::new()).build(HttpsConnector::from((http, tls))))
}

fn relay_response(response: hyper::Response<Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

fn classify(url: String, source: legacy::Error, connect_timeout: Duration) -> ProxyUpstreamError {
    if !source.is_connect() {
        ProxyUpstreamError::Request { url, source }
    } else if timed_out(&source) {
        ProxyUpstreamError::Timeout {
            url,
            after: connect_timeout,
        }
    } else {
        ProxyUpstreamError::Connect { url, source }
    }
}

fn timed_out(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(error) = current {
        if let Some(io) = error.downcast_ref::<io::Error>() {
            if io.kind() == io::ErrorKind::TimedOut {
                return true;
            }
        }
        current = error.source();
    }
    false
}

/// Upstream target for `path_and_query` under `base`, without normalization.
pub fn upstream_uri(base: &str, path_and_query: &str) -> Result<Uri, ProxyUpstreamError> {
    let raw = upstream_url(base, path_and_query);
    raw.parse::<Uri>().map_err(|e| ProxyUpstreamError::InvalidUrl {
        reason: e.to_string(),
        url: raw,
    })
}

/// Concatenate the rule base URL with the original path and query.
pub fn upstream_url(base: &str, path_and_query: &str) -> String {
    let base = base.trim_end_matches('/');
    if path_and_query.starts_with('/') {
        format!("{base}{path_and_query}")
    } else {
        format!("{base}/{path_and_query}")
    }
}

/// Headers sent upstream.
///
/// With `rewrite_to` set, `Host` is dropped so the client derives it from
/// the upstream URL, and `Origin` becomes the upstream origin.
pub fn outbound_headers(incoming: &HeaderMap, rewrite_to: Option<&Url>) -> HeaderMap {
    let mut headers = incoming.clone();
    strip_hop_by_hop(&mut headers);

    if let Some(url) = rewrite_to {
        headers.remove(header::HOST);
        if let Ok(origin) = HeaderValue::from_str(&url.origin().ascii_serialization()) {
            headers.insert(header::ORIGIN, origin);
        }
    }
    headers
}
