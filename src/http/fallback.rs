//! Static asset and single-page-application fallback.
//!
//! Requests no proxy rule claims land here. Files are served from the built
//! application directory; an extensionless path that names no file gets the
//! entry document so client-side routing can take over.

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::schema::StaticFilesConfig;

#[derive(Debug, Clone)]
pub struct StaticFallback {
    root: PathBuf,
    index: PathBuf,
    base_path: String,
}

impl StaticFallback {
    pub fn new(static_files: &StaticFilesConfig, base_path: &str) -> Self {
        Self {
            root: static_files.root.clone(),
            index: static_files.root.join(&static_files.index),
            base_path: base_path.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn serve(&self, request: Request<Body>) -> Response {
        let (mut parts, body) = request.into_parts();

        let Some(local) = self.strip_base(&parts.uri) else {
            return StatusCode::NOT_FOUND.into_response();
        };
        let spa_candidate = !has_extension(local.path());
        parts.uri = local;

        let method = parts.method.clone();
        let uri = parts.uri.clone();
        let response = ServeDir::new(&self.root)
            .oneshot(Request::from_parts(parts, body))
            .await
            .unwrap_or_else(|never| match never {});

        if response.status() != StatusCode::NOT_FOUND || !spa_candidate {
            return response.map(Body::new);
        }

        tracing::trace!(path = %uri.path(), "Serving entry document");
        let index_request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap_or_default();
        ServeFile::new(&self.index)
            .oneshot(index_request)
            .await
            .unwrap_or_else(|never| match never {})
            .map(Body::new)
    }

    /// Request URI relative to the base path, or `None` when outside it.
    fn strip_base(&self, uri: &Uri) -> Option<Uri> {
        if self.base_path.is_empty() {
            return Some(uri.clone());
        }

        let rest = uri.path().strip_prefix(&self.base_path)?;
        if !(rest.is_empty() || rest.starts_with('/')) {
            return None;
        }

        let path = if rest.is_empty() { "/" } else { rest };
        let local = match uri.query() {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        };
        local.parse().ok()
    }
}

fn has_extension(path: &str) -> bool {
    Path::new(path).extension().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site() -> (tempfile::TempDir, StaticFilesConfig) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("index.html"), "<html>app</html>").unwrap();
        fs::write(dir.path().join("assets/app.js"), "console.log(1)").unwrap();

        let config = StaticFilesConfig {
            root: dir.path().to_path_buf(),
            index: "index.html".into(),
        };
        (dir, config)
    }

    async fn get(fallback: &StaticFallback, uri: &str) -> (StatusCode, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let res = fallback.serve(req).await;
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_serves_assets_and_spa_routes() {
        let (_dir, config) = site();
        let fallback = StaticFallback::new(&config, "/");

        assert_eq!(get(&fallback, "/assets/app.js").await, (StatusCode::OK, "console.log(1)".into()));
        assert_eq!(get(&fallback, "/").await, (StatusCode::OK, "<html>app</html>".into()));
        assert_eq!(get(&fallback, "/dashboard/alerts").await, (StatusCode::OK, "<html>app</html>".into()));
        assert_eq!(get(&fallback, "/unknown-path?tab=2").await.1, "<html>app</html>");
        assert_eq!(get(&fallback, "/assets/missing.js").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_base_path_is_stripped() {
        let (_dir, config) = site();
        let fallback = StaticFallback::new(&config, "/app/");

        assert_eq!(get(&fallback, "/app/assets/app.js").await.0, StatusCode::OK);
        assert_eq!(get(&fallback, "/app").await.1, "<html>app</html>");
        assert_eq!(get(&fallback, "/application").await.0, StatusCode::NOT_FOUND);
        assert_eq!(get(&fallback, "/assets/app.js").await.0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("/assets/app.js"));
        assert!(has_extension("/favicon.ico"));
        assert!(!has_extension("/village/123"));
        assert!(!has_extension("/"));
    }
}
