use std::path::PathBuf;

use crate::buffer::GrowBuf;

const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// What a [`Response`] sends after its header block: an in-memory body, or
/// a file streamed from disk in bounded chunks. Exactly one applies.
#[derive(Debug)]
pub enum Body {
    Bytes(GrowBuf),
    File(PathBuf),
}

/// A complete HTTP response: status code, status text, content type, and
/// either an in-memory body or a file to stream.
///
/// Responses are created by the request handler (usually through the
/// convenience constructors or [`ResponseBuilder`]) and consumed by the
/// connection once sent.
///
/// # Example
///
/// ```
/// use std::fmt::Write;
/// use ember::http::response::Response;
///
/// let mut response = Response::html("<html><body>");
/// if let Some(body) = response.body_mut() {
///     write!(body, "{} bottles of beer", 99).unwrap();
///     body.append(b"</body></html>");
/// }
/// assert_eq!(response.code, 200);
/// ```
#[derive(Debug)]
pub struct Response {
    pub code: u16,
    pub status: String,
    pub content_type: String,
    pub body: Body,
}

/// Fluent builder for responses with non-default status or content type.
///
/// ```
/// use ember::http::response::ResponseBuilder;
///
/// let response = ResponseBuilder::new(200, "OK")
///     .content_type("application/json")
///     .body(b"{}")
///     .build();
/// assert_eq!(response.content_type, "application/json");
/// ```
pub struct ResponseBuilder {
    code: u16,
    status: String,
    content_type: String,
    body: GrowBuf,
}

impl ResponseBuilder {
    pub fn new(code: u16, status: impl Into<String>) -> Self {
        Self {
            code,
            status: status.into(),
            content_type: HTML_CONTENT_TYPE.to_string(),
            body: GrowBuf::new(),
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Pre-sizes the body buffer for callers that know how much they will
    /// append.
    pub fn body_capacity(mut self, capacity: usize) -> Self {
        self.body = GrowBuf::with_exact_capacity(capacity);
        self
    }

    pub fn body(mut self, bytes: &[u8]) -> Self {
        self.body.set_contents(bytes);
        self
    }

    pub fn build(self) -> Response {
        Response {
            code: self.code,
            status: self.status,
            content_type: self.content_type,
            body: Body::Bytes(self.body),
        }
    }
}

impl Response {
    /// A `200 OK` HTML response with the given body.
    pub fn html(html: &str) -> Self {
        Self::html_with_status(200, "OK", html)
    }

    /// An HTML response with an arbitrary status line.
    pub fn html_with_status(code: u16, status: impl Into<String>, html: &str) -> Self {
        ResponseBuilder::new(code, status).body(html.as_bytes()).build()
    }

    /// The canned `404 Not Found` page, naming the missing resource when
    /// one is given.
    pub fn not_found(resource: Option<&str>) -> Self {
        match resource {
            Some(resource) => Self::html_with_status(
                404,
                "Not Found",
                &format!(
                    "<html><head><title>404 Not Found</title></head>\
                     <body>The resource you specified ('{resource}') could not be found</body></html>"
                ),
            ),
            None => Self::html_with_status(
                404,
                "Not Found",
                "<html><head><title>404 Not Found</title></head>\
                 <body>The resource you specified could not be found</body></html>",
            ),
        }
    }

    /// The canned `500 Internal Error` page, with optional extra detail.
    pub fn internal_error(extra: Option<&str>) -> Self {
        match extra {
            Some(extra) => Self::html_with_status(
                500,
                "Internal Error",
                &format!(
                    "<html><head><title>500 Internal Error</title></head>\
                     <body>There was an internal error while completing your request. \
                     {extra}</body></html>"
                ),
            ),
            None => Self::html_with_status(
                500,
                "Internal Error",
                "<html><head><title>500 Internal Error</title></head>\
                 <body>There was an internal error while completing your request</body></html>",
            ),
        }
    }

    /// A response that streams the named file. The MIME type and length are
    /// determined at send time; a file that cannot be opened degrades to a
    /// 404 response.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Response {
            code: 200,
            status: "OK".to_string(),
            content_type: String::new(),
            body: Body::File(path.into()),
        }
    }

    /// Mutable access to the in-memory body for appending content
    /// (implements `std::fmt::Write`). `None` for file-backed responses.
    pub fn body_mut(&mut self) -> Option<&mut GrowBuf> {
        match &mut self.body {
            Body::Bytes(buf) => Some(buf),
            Body::File(_) => None,
        }
    }

    /// The in-memory body bytes, empty for file-backed responses.
    pub fn body_bytes(&self) -> &[u8] {
        match &self.body {
            Body::Bytes(buf) => buf.as_bytes(),
            Body::File(_) => &[],
        }
    }
}
