use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

use crate::http::parser;
use crate::http::request::Request;
use crate::http::writer;
use crate::metrics::ServerMetrics;
use crate::server::Handler;

/// Size of the per-connection receive scratch buffer, and of the chunks
/// used when streaming files.
pub(crate) const SEND_RECV_BUFFER_SIZE: usize = 16 * 1024;

/// One accepted client connection.
///
/// Owns the socket and the remote peer's numeric host/port strings. The
/// connection drives the request parser across successive reads, invokes
/// the handler once a request is complete, and sends the response. A
/// handler that wants to stream its own bytes (e.g. chunked transfer)
/// returns `None` from `handle` and uses [`write_raw`](Self::write_raw) /
/// the `*_chunked` methods instead; the core then sends nothing further.
///
/// All resources (socket, request buffers, header arena) are released when
/// the connection's task ends, on every exit path.
pub struct Connection {
    stream: TcpStream,
    remote_host: String,
    remote_port: String,
    metrics: Arc<ServerMetrics>,
    global_lock: Arc<Mutex<()>>,
    read_timeout: Option<Duration>,
}

impl Connection {
    pub(crate) fn new(
        stream: TcpStream,
        peer: SocketAddr,
        metrics: Arc<ServerMetrics>,
        global_lock: Arc<Mutex<()>>,
        read_timeout: Option<Duration>,
    ) -> Self {
        Self {
            stream,
            // Numeric, no reverse DNS.
            remote_host: peer.ip().to_string(),
            remote_port: peer.port().to_string(),
            metrics,
            global_lock,
            read_timeout,
        }
    }

    pub fn remote_host(&self) -> &str {
        &self.remote_host
    }

    pub fn remote_port(&self) -> &str {
        &self.remote_port
    }

    /// `host:port` of the peer, for logging.
    pub fn remote(&self) -> String {
        format!("{}:{}", self.remote_host, self.remote_port)
    }

    /// The server's shared counters.
    pub fn metrics(&self) -> &Arc<ServerMetrics> {
        &self.metrics
    }

    /// The advisory server-wide lock, for handlers that share a resource
    /// (e.g. one file written from several connections).
    pub fn global_lock(&self) -> Arc<Mutex<()>> {
        self.global_lock.clone()
    }

    /// Runs the connection to completion: read and parse the request,
    /// dispatch to the handler, send the response.
    pub(crate) async fn serve(mut self, handler: Arc<dyn Handler>) -> anyhow::Result<()> {
        let mut request = Request::new();
        let mut scratch = BytesMut::with_capacity(SEND_RECV_BUFFER_SIZE);

        let complete = loop {
            scratch.clear();
            let n = self.receive(&mut scratch).await?;
            if n == 0 {
                break false;
            }
            self.metrics.add_bytes_received(n as u64);
            parser::feed(&mut request, &scratch);
            if request.is_complete() {
                break true;
            }
        };

        if !complete {
            debug!(
                remote = %self.remote(),
                "peer closed before sending a complete request"
            );
            return Ok(());
        }

        debug!(
            remote = %self.remote(),
            method = %request.method,
            path = %request.path,
            version = %request.version,
            "request received"
        );

        match handler.handle(&request, &mut self).await {
            Some(response) => {
                writer::send_response(&mut self, &request.path, &response).await?;
                debug!(remote = %self.remote(), code = response.code, "response sent");
            }
            None => {
                debug!(remote = %self.remote(), "handler took over the socket");
            }
        }
        Ok(())
    }

    async fn receive(&mut self, scratch: &mut BytesMut) -> anyhow::Result<usize> {
        let remote = self.remote();
        let result = match self.read_timeout {
            Some(limit) => match timeout(limit, self.stream.read_buf(scratch)).await {
                Ok(result) => result,
                Err(_) => anyhow::bail!("read from {remote} timed out"),
            },
            None => self.stream.read_buf(scratch).await,
        };
        result.with_context(|| format!("recv from {remote} failed"))
    }

    /// Writes bytes straight to the socket, bypassing the response path.
    /// A short write surfaces as an error; the connection is then unusable.
    pub async fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes).await?;
        self.metrics.add_bytes_sent(bytes.len() as u64);
        Ok(())
    }

    /// Starts a chunked response: status line, `Transfer-Encoding: chunked`,
    /// content type, blank line. Follow with [`write_chunk`](Self::write_chunk)
    /// and finish with [`end_chunked`](Self::end_chunked).
    pub async fn begin_chunked(
        &mut self,
        code: u16,
        status: &str,
        content_type: &str,
    ) -> io::Result<()> {
        let header = format!(
            "HTTP/1.1 {code} {status}\r\n\
             Transfer-Encoding: chunked\r\n\
             Content-Type: {content_type}\r\n\r\n"
        );
        self.write_raw(header.as_bytes()).await
    }

    /// Sends one chunk, framed as `<hex-length>\r\n<bytes>\r\n`. Empty
    /// input sends nothing (a zero-length chunk would terminate the body).
    pub async fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let frame = format!("{:x}\r\n", data.len());
        self.write_raw(frame.as_bytes()).await?;
        self.write_raw(data).await?;
        self.write_raw(b"\r\n").await
    }

    /// Terminates a chunked body with the zero-length chunk.
    pub async fn end_chunked(&mut self) -> io::Result<()> {
        self.write_raw(b"0\r\n\r\n").await
    }
}
