use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use ember::config::Config;
use ember::http::connection::Connection;
use ember::http::request::Request;
use ember::http::response::Response;
use ember::server::{Handler, Server};

/// Demo handler: a welcome page, a counters page, and document-root file
/// serving. Replace this with your own `Handler` when embedding.
struct DemoHandler {
    document_root: PathBuf,
}

#[async_trait]
impl Handler for DemoHandler {
    async fn handle(&self, request: &Request, conn: &mut Connection) -> Option<Response> {
        if request.path.starts_with("/status") {
            let m = conn.metrics().snapshot();
            let mut response =
                Response::html("<html><head><title>Server Status</title></head><body>");
            if let Some(body) = response.body_mut() {
                body.append_format(format_args!(
                    "Basic measurements and status indicators for this server<br>\
                     <table border=\"1\">\n\
                     <tr><td>Active connections</td><td>{}</td></tr>\n\
                     <tr><td>Total connections</td><td>{}</td></tr>\n\
                     <tr><td>Total bytes sent</td><td>{}</td></tr>\n\
                     <tr><td>Total bytes received</td><td>{}</td></tr>\n\
                     <tr><td>Buffer allocations</td><td>{}</td></tr>\n\
                     <tr><td>Buffer reallocations</td><td>{}</td></tr>\n\
                     <tr><td>Buffer frees</td><td>{}</td></tr>\n\
                     <tr><td>Buffer bytes reserved</td><td>{}</td></tr>\n\
                     </table></body></html>",
                    m.active_connections,
                    m.total_connections,
                    m.bytes_sent,
                    m.bytes_received,
                    m.buffer_allocations,
                    m.buffer_reallocations,
                    m.buffer_frees,
                    m.buffer_bytes_reserved,
                ));
            }
            return Some(response);
        }

        if request.path == "/" {
            let mut response =
                Response::html("<html><head><title>Ember Web Server</title></head><body>");
            if let Some(body) = response.body_mut() {
                body.append(
                    b"<h2>Ember Web Server</h2>\
                      A minimal web server you embed into your application.\
                      <h2>Check it out</h2>\
                      <a href=\"/status\">Server Status</a><br>\
                      <h2>Connection Debug Info</h2><pre>",
                );
                body.append(request.debug_string(&conn.remote()).as_bytes());
                body.append(b"</pre></body></html>");
            }
            return Some(response);
        }

        // Anything else is served from the document root. Strip leading
        // path traversal nonsense; the empty path means the index.
        let decoded = request.path_decoded();
        let trimmed = decoded.trim_start_matches(['/', '.', '\\']);
        let trimmed = if trimmed.is_empty() { "index.html" } else { trimmed };
        Some(Response::file(self.document_root.join(trimmed)))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load();
    let document_root = cfg
        .document_root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let server = Server::bind(&cfg, Arc::new(DemoHandler { document_root })).await?;

    tokio::select! {
        res = server.serve() => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
