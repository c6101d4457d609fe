//! Ember - Embeddable HTTP/1.x Server
//!
//! A small server library applications link in to serve HTTP without a web
//! framework: implement [`server::Handler`], bind a [`server::Server`], and
//! return [`http::response::Response`]s.

pub mod buffer;
pub mod config;
pub mod http;
pub mod metrics;
pub mod server;
