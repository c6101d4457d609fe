use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::{Mutex, Semaphore};
use tracing::{error, info};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::metrics::ServerMetrics;
use crate::server::Handler;

const LISTEN_BACKLOG: u32 = 1024;

/// The listener/dispatcher: binds a port, accepts connections sequentially,
/// and spawns one task per connection.
///
/// The accept loop ends only when `accept` fails — closing or dropping the
/// listening socket is the supported shutdown mechanism. Handlers already
/// running are not interrupted and finish naturally.
pub struct Server {
    listener: TcpListener,
    handler: Arc<dyn Handler>,
    metrics: Arc<ServerMetrics>,
    global_lock: Arc<Mutex<()>>,
    limiter: Option<Arc<Semaphore>>,
    read_timeout: Option<Duration>,
}

impl Server {
    /// Binds to the configured address with `SO_REUSEADDR` so restarts do
    /// not trip over sockets in TIME_WAIT.
    pub async fn bind(config: &Config, handler: Arc<dyn Handler>) -> Result<Self> {
        let addr: SocketAddr = config
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address '{}'", config.listen_addr))?;
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .context("creating listener socket")?;
        socket.set_reuseaddr(true).context("setting SO_REUSEADDR")?;
        socket
            .bind(addr)
            .with_context(|| format!("binding to {addr}"))?;
        let listener = socket.listen(LISTEN_BACKLOG).context("listening")?;
        info!(addr = %addr, "listening for connections");

        Ok(Self {
            listener,
            handler,
            metrics: ServerMetrics::new(),
            global_lock: Arc::new(Mutex::new(())),
            limiter: config
                .max_connections
                .map(|n| Arc::new(Semaphore::new(n))),
            read_timeout: config.read_timeout(),
        })
    }

    /// The bound address; useful when listening on port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("reading local address")
    }

    /// Shared counters, read-only for diagnostics.
    pub fn metrics(&self) -> Arc<ServerMetrics> {
        self.metrics.clone()
    }

    /// The advisory lock handlers can use to serialize access to their own
    /// shared resources.
    pub fn global_lock(&self) -> Arc<Mutex<()>> {
        self.global_lock.clone()
    }

    /// Accepts connections forever, one spawned handler task each.
    pub async fn serve(self) -> Result<()> {
        loop {
            // With a connection cap configured, wait for a free slot before
            // accepting (backpressure into the listen queue).
            let permit = match &self.limiter {
                Some(limiter) => limiter.clone().acquire_owned().await.ok(),
                None => None,
            };

            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    info!(error = %e, "accept failed, shutting down dispatch loop");
                    return Ok(());
                }
            };
            info!(remote = %peer, "accepted connection");
            self.metrics.connection_opened();

            let handler = self.handler.clone();
            let metrics = self.metrics.clone();
            let global_lock = self.global_lock.clone();
            let read_timeout = self.read_timeout;
            tokio::spawn(async move {
                let conn = Connection::new(stream, peer, metrics.clone(), global_lock, read_timeout);
                let remote = conn.remote();
                if let Err(e) = conn.serve(handler).await {
                    error!(remote = %remote, error = %e, "connection error");
                }
                metrics.connection_closed();
                drop(permit);
            });
        }
    }
}
