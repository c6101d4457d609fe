use std::fmt::Write as _;

use crate::buffer::GrowBuf;
use crate::http::parser::ParseState;
use crate::http::query;

/// Maximum length of the request method, counted in wire bytes. Longer
/// methods are truncated with a warning.
pub const METHOD_MAX: usize = 64;
/// Maximum length of the request path, counted in wire bytes.
pub const PATH_MAX: usize = 1024;
/// Maximum length of the HTTP version string, counted in wire bytes.
pub const VERSION_MAX: usize = 16;
/// Maximum number of headers kept per request; further headers are dropped.
pub const MAX_HEADERS: usize = 64;
/// Size of the per-request header arena. Name and value bytes beyond this
/// are dropped, never written out of bounds.
pub const HEADER_POOL_BYTES: usize = 16 * 1024;
/// Largest request body the parser will buffer.
pub const MAX_BODY_LENGTH: u64 = 128 * 1024 * 1024;

/// A byte range into the request's header arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: usize,
    pub len: usize,
}

/// One parsed header: name and value stored as ranges into the arena, so no
/// header ever gets its own heap allocation during parsing.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Header {
    pub name: Span,
    pub value: Span,
}

/// Fixed-capacity bump arena backing all header names and values of one
/// request. Exhaustion is graceful: once full, further bytes are refused.
#[derive(Debug, Default)]
pub(crate) struct HeaderArena {
    bytes: Vec<u8>,
}

impl HeaderArena {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Appends one byte, refusing (returning `false`) when the pool is
    /// exhausted.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.bytes.len() >= HEADER_POOL_BYTES {
            return false;
        }
        self.bytes.push(byte);
        true
    }

    pub fn get(&self, span: Span) -> &[u8] {
        &self.bytes[span.start..span.start + span.len]
    }
}

/// One-shot warning flags so a flood of over-long input does not repeat the
/// same log line for every byte.
#[derive(Debug, Default)]
pub(crate) struct TruncationFlags {
    pub method: bool,
    pub path: bool,
    pub version: bool,
    pub pool: bool,
}

/// A parsed (or partially parsed) HTTP request.
///
/// A `Request` starts zero-valued when the connection is accepted and is
/// mutated incrementally by [`parser::feed`](crate::http::parser::feed) as
/// bytes arrive from the socket. The request line fields are bounded
/// ([`METHOD_MAX`], [`PATH_MAX`], [`VERSION_MAX`]); headers live as spans
/// into a fixed arena; the body buffer exists only if a `Content-Length`
/// header was parsed.
#[derive(Debug, Default)]
pub struct Request {
    /// HTTP method (GET, POST, ...), as sent.
    pub method: String,
    /// Raw request path, undecoded (e.g. `/index.html?name=Forrest`).
    /// Use [`path_decoded`](Self::path_decoded) for the percent-decoded form.
    pub path: String,
    /// HTTP version string (e.g. `HTTP/1.0`).
    pub version: String,
    /// Request body, present only when `Content-Length` was parsed.
    pub body: Option<GrowBuf>,
    pub(crate) headers: Vec<Header>,
    pub(crate) arena: HeaderArena,
    pub(crate) state: ParseState,
    pub(crate) pending_name: Option<Span>,
    pub(crate) pending_value: Option<Span>,
    pub(crate) warned: TruncationFlags,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current parser state; [`is_complete`](Self::is_complete) is usually
    /// what callers want.
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// True once the parser has consumed a full request (terminal state).
    pub fn is_complete(&self) -> bool {
        self.state == ParseState::Done
    }

    /// Looks up a header value by name, case-insensitively.
    ///
    /// Returns the first header with that name, in insertion order.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| self.arena.get(h.name).eq_ignore_ascii_case(name.as_bytes()))
            .and_then(|h| std::str::from_utf8(self.arena.get(h.value)).ok())
    }

    /// All headers in insertion order. Pairs that are not valid UTF-8 are
    /// skipped.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().filter_map(|h| {
            let name = std::str::from_utf8(self.arena.get(h.name)).ok()?;
            let value = std::str::from_utf8(self.arena.get(h.value)).ok()?;
            Some((name, value))
        })
    }

    /// The `Content-Length` header parsed as an integer, if present and
    /// well-formed.
    pub fn content_length(&self) -> Option<u64> {
        self.header("Content-Length")
            .and_then(|v| v.trim().parse().ok())
    }

    /// The request path with `%XX` escapes decoded. `+` is left intact; it
    /// only means space inside form data.
    pub fn path_decoded(&self) -> String {
        query::percent_decode(&self.path)
    }

    /// Decodes a query parameter from the request path.
    ///
    /// ```
    /// # use ember::http::request::Request;
    /// let mut req = Request::new();
    /// req.path = "/greet?name=Forrest+Heller".to_string();
    /// assert_eq!(req.get_param("name").as_deref(), Some("Forrest Heller"));
    /// assert_eq!(req.get_param("missing").as_deref().unwrap_or("nobody"), "nobody");
    /// ```
    pub fn get_param(&self, name: &str) -> Option<String> {
        query::decode_param(&self.path, name)
    }

    /// Decodes a form parameter from the request body (POST forms).
    pub fn post_param(&self, name: &str) -> Option<String> {
        let body = self.body.as_ref()?;
        let text = String::from_utf8_lossy(body.as_bytes());
        query::decode_param(&text, name)
    }

    /// A printable summary of the request (method, remote peer, headers,
    /// body), handy for embedding in debug pages inside `<pre>` tags.
    pub fn debug_string(&self, remote: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} from {}", self.method, remote);
        out.push_str("\n*** Request Headers ***\n");
        for (name, value) in self.headers() {
            let _ = writeln!(out, "'{}' = '{}'", name, value);
        }
        if let Some(body) = &self.body {
            let _ = writeln!(
                out,
                "\n*** Request Body ***\n{}",
                String::from_utf8_lossy(body.as_bytes())
            );
        }
        out
    }
}
