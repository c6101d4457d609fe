use tracing::warn;

use crate::buffer::GrowBuf;
use crate::http::request::{
    HeaderArena, MAX_BODY_LENGTH, MAX_HEADERS, METHOD_MAX, PATH_MAX, Request, Span, VERSION_MAX,
    Header,
};

/// Parser states, driven one byte at a time.
///
/// The machine has no lookahead beyond the current byte, so feeding it a
/// request split at arbitrary boundaries (including mid-line) produces the
/// same final [`Request`] as feeding it byte-by-byte. That lets raw `recv`
/// chunks drive it directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseState {
    #[default]
    Method,
    Path,
    Version,
    HeaderName,
    HeaderValue,
    Cr,
    CrLf,
    CrLfCr,
    Body,
    Done,
}

/// Feeds one fragment of raw request bytes into the parser.
///
/// Call repeatedly with whatever the socket delivers until
/// [`Request::is_complete`] returns true. Malformed input never fails; the
/// parser recovers to a consistent state (over-long fields are truncated
/// with a warning, a header line without `:` is skipped at its `\r`).
/// Bytes arriving after completion are ignored.
pub fn feed(request: &mut Request, fragment: &[u8]) {
    let mut i = 0;
    while i < fragment.len() {
        let c = fragment[i];
        match request.state {
            ParseState::Method => {
                if c == b' ' {
                    request.state = ParseState::Path;
                } else {
                    push_bounded(
                        &mut request.method,
                        c,
                        METHOD_MAX,
                        &mut request.warned.method,
                        "method",
                    );
                }
            }
            ParseState::Path => {
                if c == b' ' {
                    request.state = ParseState::Version;
                } else {
                    push_bounded(
                        &mut request.path,
                        c,
                        PATH_MAX,
                        &mut request.warned.path,
                        "path",
                    );
                }
            }
            ParseState::Version => {
                if c == b'\r' {
                    request.state = ParseState::Cr;
                } else {
                    push_bounded(
                        &mut request.version,
                        c,
                        VERSION_MAX,
                        &mut request.warned.version,
                        "version",
                    );
                }
            }
            ParseState::HeaderName => {
                if c == b':' {
                    request.state = ParseState::HeaderValue;
                } else if c == b'\r' {
                    // Header line without a colon. Skip to end-of-headers
                    // detection rather than failing the request.
                    request.state = ParseState::Cr;
                } else if request.headers.len() < MAX_HEADERS {
                    append_pool_byte(
                        &mut request.arena,
                        &mut request.pending_name,
                        &mut request.warned.pool,
                        c,
                    );
                }
            }
            ParseState::HeaderValue => {
                if c == b' ' && request.pending_value.is_none() {
                    // Leading space after the colon is not part of the value.
                } else if c == b'\r' {
                    if request.headers.len() < MAX_HEADERS {
                        request.headers.push(Header {
                            name: request.pending_name.take().unwrap_or_default(),
                            value: request.pending_value.take().unwrap_or_default(),
                        });
                    }
                    request.state = ParseState::Cr;
                } else if request.headers.len() < MAX_HEADERS {
                    append_pool_byte(
                        &mut request.arena,
                        &mut request.pending_value,
                        &mut request.warned.pool,
                        c,
                    );
                }
            }
            ParseState::Cr => {
                request.state = if c == b'\n' {
                    ParseState::CrLf
                } else {
                    ParseState::HeaderName
                };
            }
            ParseState::CrLf => {
                if c == b'\r' {
                    request.state = ParseState::CrLfCr;
                } else {
                    // First byte of the next header name: replay it so the
                    // HeaderName state consumes it.
                    request.state = ParseState::HeaderName;
                    continue;
                }
            }
            ParseState::CrLfCr => {
                if c == b'\n' {
                    request.state = ParseState::Done;
                    if let Some(length) = request.content_length() {
                        if length > MAX_BODY_LENGTH {
                            warn!(
                                content_length = length,
                                limit = MAX_BODY_LENGTH,
                                "request body too large, skipping body"
                            );
                        } else if length > 0 {
                            request.body = Some(GrowBuf::with_exact_capacity(length as usize));
                            request.state = ParseState::Body;
                        }
                    }
                } else {
                    request.state = ParseState::HeaderName;
                }
            }
            ParseState::Body => {
                match request.body.as_mut() {
                    Some(body) => {
                        let taken = body.extend_within_capacity(&fragment[i..]);
                        i += taken;
                        if body.len() >= body.capacity() {
                            request.state = ParseState::Done;
                        }
                    }
                    // Unreachable by construction; recover instead of
                    // looping on the same byte.
                    None => request.state = ParseState::Done,
                }
                continue;
            }
            ParseState::Done => return,
        }
        i += 1;
    }
}

/// Appends a byte to a bounded request-line field, truncating (once-warned)
/// past the limit. Each wire byte is stored as one `char` (bytes over 127
/// widen to two UTF-8 bytes), so the bound counts chars, not stored bytes.
fn push_bounded(field: &mut String, c: u8, max: usize, warned: &mut bool, what: &'static str) {
    if field.chars().count() < max {
        field.push(char::from(c));
    } else if !*warned {
        warn!(field = what, limit = max, "request field too long, truncating");
        *warned = true;
    }
}

/// Appends a byte to the current in-progress pool string, lazily claiming
/// its start offset in the arena. Exhaustion drops the byte.
fn append_pool_byte(arena: &mut HeaderArena, span: &mut Option<Span>, warned: &mut bool, c: u8) {
    let span = span.get_or_insert(Span {
        start: arena.len(),
        len: 0,
    });
    if arena.push(c) {
        span.len += 1;
    } else if !*warned {
        warn!("header pool exhausted, dropping further header bytes");
        *warned = true;
    }
}
