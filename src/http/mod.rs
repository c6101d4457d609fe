//! HTTP/1.x protocol implementation.
//!
//! This module implements an HTTP/1.0-style request/response server: one
//! request per connection, no keep-alive or pipelining.
//!
//! # Architecture
//!
//! - **`parser`**: incremental byte-at-a-time request parser
//! - **`request`**: request representation, bounded fields, header arena
//! - **`query`**: GET/POST parameter decoding and HTML escaping
//! - **`response`**: response representation with builder and canned pages
//! - **`mime`**: MIME type detection for served files
//! - **`connection`**: per-connection read/dispatch/send loop
//! - **`writer`**: serializes responses, streams files
//!
//! # Parser state machine
//!
//! The parser consumes raw socket fragments byte by byte, with no lookahead,
//! so chunk boundaries never change the outcome:
//!
//! ```text
//!   Method ──space──▶ Path ──space──▶ Version ──CR──▶ Cr
//!                                                      │ LF
//!                                                      ▼
//!        ┌──────── replay byte ──────────────────── CrLf ──CR──▶ CrLfCr
//!        ▼                                                          │ LF
//!   HeaderName ──":"──▶ HeaderValue ──CR──▶ Cr            Content-Length?
//!        ▲                                                   │yes     │no
//!        └──────── next header line ◀───┘                    ▼        ▼
//!                                                          Body ──▶ Done
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use ember::config::Config;
//! use ember::http::connection::Connection;
//! use ember::http::request::Request;
//! use ember::http::response::Response;
//! use ember::server::{Handler, Server};
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Handler for Hello {
//!     async fn handle(&self, request: &Request, _conn: &mut Connection) -> Option<Response> {
//!         Some(Response::html(&format!("<html>hello {}</html>", request.path)))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = Server::bind(&Config::default(), Arc::new(Hello)).await?;
//!     server.serve().await
//! }
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod query;
pub mod request;
pub mod response;
pub(crate) mod writer;
