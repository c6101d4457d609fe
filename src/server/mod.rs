//! Server surface: the listener/dispatcher and the handler boundary.

pub mod listener;

pub use listener::Server;

use async_trait::async_trait;

use crate::http::connection::Connection;
use crate::http::request::Request;
use crate::http::response::Response;

/// The application's request handler, invoked once per completed request.
///
/// Return `Some(response)` and the core sends it. Return `None` to signal
/// that the handler has taken ownership of the socket (for example to write
/// a chunked stream through [`Connection::write_chunk`]); the core then
/// sends nothing further on that connection.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: &Request, conn: &mut Connection) -> Option<Response>;
}
