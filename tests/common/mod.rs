//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use village_devserver::config::schema::{
    ListenerConfig, ObservabilityConfig, StaticFilesConfig, TimeoutConfig,
};
use village_devserver::config::{RouteRule, ServerConfig};
use village_devserver::{HttpServer, Shutdown};

/// A request as seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    /// Lowercased header names.
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Canned upstream answer.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: vec![("x-upstream".into(), "mock".into())],
            body: body.into(),
        }
    }
}

pub type Recorded = Arc<Mutex<Vec<RecordedRequest>>>;

/// Start a mock upstream that records every request and answers with
/// `respond(request)`.
pub async fn start_backend<F>(respond: F) -> (SocketAddr, Recorded)
where
    F: Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let log = recorded.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let log = log.clone();
            let respond = respond.clone();
            tokio::spawn(async move {
                answer(&mut socket, &log, respond.as_ref()).await;
            });
        }
    });

    (addr, recorded)
}

/// Echo upstream behind TLS with the self-signed certificate in
/// `tests/fixtures`, issued for `localhost` and `127.0.0.1`.
pub async fn start_tls_backend() -> (SocketAddr, Recorded) {
    let identity = native_tls::Identity::from_pkcs8(
        include_bytes!("../fixtures/self-signed.crt"),
        include_bytes!("../fixtures/self-signed.key"),
    )
    .unwrap();
    let acceptor = tokio_native_tls::TlsAcceptor::from(native_tls::TlsAcceptor::new(identity).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));

    let log = recorded.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let log = log.clone();
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let Ok(mut stream) = acceptor.accept(socket).await else {
                    return;
                };
                answer(&mut stream, &log, &|req: &RecordedRequest| {
                    MockResponse::ok(format!("tls:{}", req.target))
                })
                .await;
            });
        }
    });

    (addr, recorded)
}

/// Upstream that reads one request, never answers, and reports
/// `"received"` then `"closed"` once the proxy drops the connection.
pub async fn start_hanging_backend() -> (SocketAddr, mpsc::UnboundedReceiver<&'static str>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (events, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let events = events.clone();
            tokio::spawn(async move {
                if read_request(&mut socket).await.is_none() {
                    return;
                }
                let _ = events.send("received");

                let mut chunk = [0u8; 1024];
                loop {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => continue,
                    }
                }
                let _ = events.send("closed");
            });
        }
    });

    (addr, rx)
}

/// Mock upstream that echoes the request target in the body.
pub async fn start_echo_backend() -> (SocketAddr, Recorded) {
    start_backend(|req| MockResponse::ok(format!("upstream:{}", req.target))).await
}

/// Upstream that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Config with every default prefix pointing at `upstream` and a static root
/// holding an `index.html`.
pub fn test_config(upstream: &str, static_root: &Path) -> ServerConfig {
    fs::write(static_root.join("index.html"), "<!doctype html><div id=\"root\"></div>").unwrap();

    ServerConfig {
        listener: ListenerConfig {
            port: 0,
            bind_all_interfaces: false,
        },
        base_path: "/".into(),
        routes: village_devserver::config::schema::DEFAULT_PROXY_PREFIXES
            .iter()
            .map(|prefix| RouteRule::new(*prefix, upstream))
            .collect(),
        aliases: Vec::new(),
        timeouts: TimeoutConfig {
            connect_secs: 2,
            response_secs: 2,
        },
        static_files: StaticFilesConfig {
            root: static_root.to_path_buf(),
            index: "index.html".into(),
        },
        observability: ObservabilityConfig::default(),
    }
}

/// Start the dev server on an ephemeral port.
pub async fn start_server(config: ServerConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

/// Client that talks to the dev server directly and never follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

async fn answer<S, F>(socket: &mut S, log: &Recorded, respond: &F)
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: Fn(&RecordedRequest) -> MockResponse + ?Sized,
{
    let Some(request) = read_request(socket).await else {
        return;
    };
    let response = respond(&request);
    log.lock().unwrap().push(request);

    let mut out = format!("HTTP/1.1 {} {}\r\n", response.status, reason(response.status));
    for (name, value) in &response.headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.body.len(),
        response.body
    ));
    let _ = socket.write_all(out.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Send `GET <target>` exactly as written and return the raw response.
pub async fn raw_get(addr: SocketAddr, target: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {target} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

async fn read_request<S>(socket: &mut S) -> Option<RecordedRequest>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(RecordedRequest {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        302 => "Found",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
