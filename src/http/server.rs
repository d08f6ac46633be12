//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the alias resolver, then the routing table and upstream clients
//! - Create the Axum router with a single dispatch handler
//! - Wire up middleware (request ID, tracing)
//! - Dispatch requests to the proxy relay or the static/SPA fallback
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::alias::AliasResolver;
use crate::config::ServerConfig;
use crate::http::fallback::StaticFallback;
use crate::http::request::{request_id, RequestIdGenerator};
use crate::http::upstream::UpstreamClient;
use crate::observability::metrics::{self, RequestKind};
use crate::routing::Router as ProxyRouter;

/// Error type for server construction and serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] native_tls::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub upstream: Arc<UpstreamClient>,
    pub fallback: Arc<StaticFallback>,
}

/// Development server front door.
pub struct HttpServer {
    app: Router,
    config: Arc<ServerConfig>,
    resolver: Arc<AliasResolver>,
    router: Arc<ProxyRouter>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        // Build-time concern first: alias resolution.
        let resolver = Arc::new(AliasResolver::new(config.aliases.clone()));
        if let Err(errors) = resolver.verify_targets() {
            for error in errors {
                tracing::warn!(%error, "Alias target missing; imports through it will fail to resolve");
            }
        }

        // Request-time concern: proxy routing.
        let router = Arc::new(ProxyRouter::from_rules(&config.routes));
        let upstream = Arc::new(UpstreamClient::new(&config.routes, &config.timeouts)?);
        let fallback = Arc::new(StaticFallback::new(&config.static_files, &config.base_path));

        if !fallback.root().is_dir() {
            tracing::warn!(root = %fallback.root().display(), "Static root does not exist; unproxied requests will 404");
        }

        let state = AppState {
            router: router.clone(),
            upstream,
            fallback,
        };

        Ok(Self {
            app: Self::build_router(state),
            config: Arc::new(config),
            resolver,
            router,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(RequestIdGenerator))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.router.len(),
            aliases = self.resolver.rules().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.app.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn resolver(&self) -> &AliasResolver {
        &self.resolver
    }

    pub fn router(&self) -> &ProxyRouter {
        &self.router
    }
}

/// Single entry point: proxy on a rule match, static/SPA fallback otherwise.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let Some(rule) = state.router.match_path(&path) else {
        tracing::debug!(request_id = %request_id, method = %method, path = %path, "No proxy rule matched");
        let response = state.fallback.serve(request).await;
        metrics::record_request(RequestKind::Static, method.as_str(), response.status().as_u16(), "static", start_time);
        return response;
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        prefix = %rule.path_prefix,
        upstream = %rule.upstream_base_url,
        "Proxying request"
    );

    match state.upstream.forward(rule, request).await {
        Ok(response) => {
            let status = response.status();
            tracing::info!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status = status.as_u16(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Proxied"
            );
            metrics::record_request(RequestKind::Proxy, method.as_str(), status.as_u16(), &rule.path_prefix, start_time);
            response
        }
        Err(error) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                error = %error,
                "Upstream error"
            );
            let response = error.into_response();
            metrics::record_request(RequestKind::Proxy, method.as_str(), response.status().as_u16(), &rule.path_prefix, start_time);
            metrics::record_upstream_failure(&rule.path_prefix);
            response
        }
    }
}
