use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use ember::config::Config;
use ember::http::connection::Connection;
use ember::http::request::Request;
use ember::http::response::Response;
use ember::server::{Handler, Server};

struct TestHandler;

#[async_trait]
impl Handler for TestHandler {
    async fn handle(&self, request: &Request, conn: &mut Connection) -> Option<Response> {
        if request.path.starts_with("/status") {
            let m = conn.metrics().snapshot();
            let mut response = Response::html("<html><body>");
            if let Some(body) = response.body_mut() {
                body.append_format(format_args!(
                    "active={} total={} received={}</body></html>",
                    m.active_connections, m.total_connections, m.bytes_received
                ));
            }
            return Some(response);
        }
        match request.path.as_str() {
            "/echo" => {
                let body = request
                    .body
                    .as_ref()
                    .map(|b| b.as_bytes().to_vec())
                    .unwrap_or_default();
                Some(Response::html(&format!(
                    "len={} body={}",
                    body.len(),
                    String::from_utf8_lossy(&body)
                )))
            }
            "/stream" => {
                conn.begin_chunked(200, "OK", "text/plain").await.ok()?;
                conn.write_chunk(b"hello ").await.ok()?;
                conn.write_chunk(b"world").await.ok()?;
                conn.end_chunked().await.ok()?;
                None
            }
            "/missing-file" => Some(Response::file("definitely-not-here-ember-test.bin")),
            _ => Some(Response::not_found(Some(&request.path))),
        }
    }
}

struct FileHandler {
    path: std::path::PathBuf,
}

#[async_trait]
impl Handler for FileHandler {
    async fn handle(&self, _request: &Request, _conn: &mut Connection) -> Option<Response> {
        Some(Response::file(self.path.clone()))
    }
}

async fn start(handler: Arc<dyn Handler>) -> SocketAddr {
    let cfg = Config {
        listen_addr: "127.0.0.1:0".to_string(),
        ..Config::default()
    };
    let server = Server::bind(&cfg, handler).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.serve());
    addr
}

async fn roundtrip(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn test_status_page_reports_counters() {
    let addr = start(Arc::new(TestHandler)).await;
    let response = roundtrip(addr, b"GET /status HTTP/1.0\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "{response}");
    assert!(response.contains("Content-Type: text/html"));
    assert!(response.contains("Content-Length: "));
    assert!(response.contains("active=1"));
    assert!(response.contains("total=1"));
}

#[tokio::test]
async fn test_post_body_across_uneven_socket_reads() {
    let addr = start(Arc::new(TestHandler)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    // Deliver the request in awkward pieces: mid-header, mid-body.
    for piece in [
        &b"POST /echo HTT"[..],
        b"P/1.0\r\nContent-Len",
        b"gth: 12\r\n\r\nhel",
        b"lo wo",
        b"rld!",
    ] {
        stream.write_all(piece).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);
    assert!(response.contains("len=12"), "{response}");
    assert!(response.contains("body=hello world!"));
}

#[tokio::test]
async fn test_chunked_takeover() {
    let addr = start(Arc::new(TestHandler)).await;
    let response = roundtrip(addr, b"GET /stream HTTP/1.0\r\n\r\n").await;

    assert!(response.contains("Transfer-Encoding: chunked"));
    assert!(response.contains("6\r\nhello \r\n5\r\nworld\r\n0\r\n\r\n"), "{response}");
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let addr = start(Arc::new(TestHandler)).await;
    let response = roundtrip(addr, b"GET /nope HTTP/1.0\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.0 404 Not Found\r\n"));
    assert!(response.contains("/nope"));
}

#[tokio::test]
async fn test_missing_file_degrades_to_404() {
    let addr = start(Arc::new(TestHandler)).await;
    let response = roundtrip(addr, b"GET /missing-file HTTP/1.0\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.0 404 Not Found\r\n"), "{response}");
}

#[tokio::test]
async fn test_file_is_streamed_with_mime_and_length() {
    let path = std::env::temp_dir().join("ember-test-style.css");
    let contents = b"body {\n\tbackground-color: purple;\n\tcolor: white;\n}";
    std::fs::write(&path, contents).unwrap();

    let addr = start(Arc::new(FileHandler { path: path.clone() })).await;
    let response = roundtrip(addr, b"GET /style.css HTTP/1.0\r\n\r\n").await;
    std::fs::remove_file(&path).ok();

    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "{response}");
    assert!(response.contains("Content-Type: text/css"));
    assert!(response.contains(&format!("Content-Length: {}", contents.len())));
    assert!(response.ends_with(std::str::from_utf8(contents).unwrap()));
}

#[tokio::test]
async fn test_metrics_accumulate_across_connections() {
    let cfg = Config {
        listen_addr: "127.0.0.1:0".to_string(),
        ..Config::default()
    };
    let server = Server::bind(&cfg, Arc::new(TestHandler)).await.unwrap();
    let addr = server.local_addr().unwrap();
    let metrics = server.metrics();
    tokio::spawn(server.serve());

    for _ in 0..3 {
        roundtrip(addr, b"GET /status HTTP/1.0\r\n\r\n").await;
    }

    // Give the handler tasks a beat to finish their bookkeeping.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snap = metrics.snapshot();
    assert_eq!(snap.total_connections, 3);
    assert_eq!(snap.active_connections, 0);
    assert!(snap.bytes_received >= 3 * 24);
    assert!(snap.bytes_sent > 0);
}
