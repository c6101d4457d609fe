use ember::http::parser::{self, ParseState};
use ember::http::request::{HEADER_POOL_BYTES, MAX_HEADERS, PATH_MAX, Request};

fn parse_whole(raw: &[u8]) -> Request {
    let mut request = Request::new();
    parser::feed(&mut request, raw);
    request
}

fn parse_in_chunks(raw: &[u8], chunk_size: usize) -> Request {
    let mut request = Request::new();
    for chunk in raw.chunks(chunk_size) {
        parser::feed(&mut request, chunk);
    }
    request
}

fn assert_same_request(a: &Request, b: &Request) {
    assert_eq!(a.method, b.method);
    assert_eq!(a.path, b.path);
    assert_eq!(a.version, b.version);
    assert_eq!(a.state(), b.state());
    let headers_a: Vec<_> = a.headers().collect();
    let headers_b: Vec<_> = b.headers().collect();
    assert_eq!(headers_a, headers_b);
    assert_eq!(
        a.body.as_ref().map(|b| b.as_bytes().to_vec()),
        b.body.as_ref().map(|b| b.as_bytes().to_vec())
    );
}

#[test]
fn test_parse_simple_get_request() {
    let request = parse_whole(b"GET /index.html HTTP/1.0\r\nHost: example.com\r\n\r\n");

    assert!(request.is_complete());
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/index.html");
    assert_eq!(request.version, "HTTP/1.0");
    assert_eq!(request.header("Host"), Some("example.com"));
    assert!(request.body.is_none());
}

#[test]
fn test_streaming_invariance_across_chunk_sizes() {
    let raw: &[u8] = b"POST /submit?x=1 HTTP/1.0\r\n\
                       Host: example.com\r\n\
                       User-Agent: test-client\r\n\
                       Content-Length: 11\r\n\
                       \r\n\
                       hello world";
    let reference = parse_whole(raw);
    assert!(reference.is_complete());

    for chunk_size in 1..raw.len() {
        let chunked = parse_in_chunks(raw, chunk_size);
        assert_same_request(&reference, &chunked);
    }
}

#[test]
fn test_header_value_leading_space_is_stripped() {
    let request = parse_whole(b"GET / HTTP/1.0\r\nAccept: */*\r\nX-Raw:nospace\r\n\r\n");
    assert_eq!(request.header("Accept"), Some("*/*"));
    assert_eq!(request.header("X-Raw"), Some("nospace"));
}

#[test]
fn test_header_lookup_is_case_insensitive() {
    let request = parse_whole(b"GET / HTTP/1.0\r\nContent-Type: text/plain\r\n\r\n");
    assert_eq!(request.header("content-type"), Some("text/plain"));
    assert_eq!(request.header("CONTENT-TYPE"), Some("text/plain"));
}

#[test]
fn test_headers_preserve_insertion_order() {
    let request =
        parse_whole(b"GET / HTTP/1.0\r\nFirst: 1\r\nSecond: 2\r\nThird: 3\r\n\r\n");
    let names: Vec<_> = request.headers().map(|(n, _)| n.to_string()).collect();
    assert_eq!(names, ["First", "Second", "Third"]);
}

#[test]
fn test_body_captured_exactly_content_length_bytes() {
    let request = parse_whole(b"POST /api HTTP/1.0\r\nContent-Length: 5\r\n\r\nhelloEXTRA");
    assert!(request.is_complete());
    let body = request.body.expect("body should be allocated");
    assert_eq!(body.as_bytes(), b"hello");
    assert_eq!(body.capacity(), 5);
}

#[test]
fn test_body_across_uneven_fragments() {
    let mut request = Request::new();
    parser::feed(&mut request, b"POST /api HTTP/1.0\r\nConte");
    parser::feed(&mut request, b"nt-Length: 10\r\n\r");
    assert!(!request.is_complete());
    parser::feed(&mut request, b"\nabc");
    assert_eq!(request.state(), ParseState::Body);
    parser::feed(&mut request, b"defg");
    parser::feed(&mut request, b"hij");
    assert!(request.is_complete());
    assert_eq!(request.body.unwrap().as_bytes(), b"abcdefghij");
}

#[test]
fn test_no_content_length_means_no_body() {
    let request = parse_whole(b"GET / HTTP/1.0\r\n\r\n");
    assert!(request.is_complete());
    assert!(request.body.is_none());
}

#[test]
fn test_zero_content_length_means_no_body() {
    let request = parse_whole(b"POST / HTTP/1.0\r\nContent-Length: 0\r\n\r\n");
    assert!(request.is_complete());
    assert!(request.body.is_none());
}

#[test]
fn test_binary_body() {
    let request = parse_whole(b"POST /up HTTP/1.0\r\nContent-Length: 4\r\n\r\n\x00\x01\x02\x03");
    assert_eq!(request.body.unwrap().as_bytes(), &[0, 1, 2, 3]);
}

#[test]
fn test_bytes_after_done_are_ignored() {
    let mut request = parse_whole(b"GET / HTTP/1.0\r\n\r\n");
    parser::feed(&mut request, b"GET /other HTTP/1.0\r\n\r\n");
    assert_eq!(request.path, "/");
}

#[test]
fn test_malformed_header_line_merges_into_next_name() {
    // A line without a colon recovers at its CR, but its accumulated name
    // bytes are kept: the next line's name appends to them, so the two
    // lines merge into one header. The request still parses to completion.
    let request = parse_whole(b"GET / HTTP/1.0\r\nBrokenHeader\r\nGood: yes\r\n\r\n");
    assert!(request.is_complete());
    assert_eq!(request.header("BrokenHeaderGood"), Some("yes"));
    assert_eq!(request.header("Good"), None);
}

#[test]
fn test_content_length_over_limit_skips_body() {
    // 128 MiB + 1 declared; the body is never buffered and the request is
    // complete without one. No body bytes need to arrive.
    let request = parse_whole(b"POST /up HTTP/1.0\r\nContent-Length: 134217729\r\n\r\n");
    assert!(request.is_complete());
    assert!(request.body.is_none());
}

#[test]
fn test_path_bound_counts_wire_bytes() {
    // High bytes widen to two UTF-8 bytes when stored; the truncation
    // bound still counts bytes as they arrived on the wire.
    let mut raw = Vec::from(&b"GET /"[..]);
    raw.extend(std::iter::repeat_n(0xFFu8, PATH_MAX * 2));
    raw.extend_from_slice(b" HTTP/1.0\r\n\r\n");
    let request = parse_whole(&raw);
    assert!(request.is_complete());
    assert_eq!(request.path.chars().count(), PATH_MAX);
    assert!(request.path.len() > PATH_MAX);
}

#[test]
fn test_oversized_path_is_truncated_not_overflowed() {
    let long_path = format!("/{}", "a".repeat(PATH_MAX * 2));
    let raw = format!("GET {long_path} HTTP/1.0\r\n\r\n");
    let request = parse_whole(raw.as_bytes());
    assert!(request.is_complete());
    assert_eq!(request.path.len(), PATH_MAX);
}

#[test]
fn test_header_count_limit_drops_excess_headers() {
    let mut raw = String::from("GET / HTTP/1.0\r\n");
    for i in 0..(MAX_HEADERS + 10) {
        raw.push_str(&format!("X-Header-{i}: value\r\n"));
    }
    raw.push_str("\r\n");
    let request = parse_whole(raw.as_bytes());
    assert!(request.is_complete());
    assert_eq!(request.headers().count(), MAX_HEADERS);
}

#[test]
fn test_header_pool_exhaustion_degrades_gracefully() {
    // A single enormous header value overflows the 16 KiB arena; extra
    // bytes are dropped and parsing still completes.
    let big = "v".repeat(HEADER_POOL_BYTES * 2);
    let raw = format!("GET / HTTP/1.0\r\nBig: {big}\r\nAfter: ok\r\n\r\n");
    let request = parse_whole(raw.as_bytes());
    assert!(request.is_complete());
    let stored = request.header("Big").expect("header should exist");
    assert!(stored.len() < big.len());
}

#[test]
fn test_request_line_split_at_every_boundary() {
    let raw = b"GET /path HTTP/1.0\r\nHost: h\r\n\r\n";
    let reference = parse_whole(raw);
    for split in 1..raw.len() {
        let mut request = Request::new();
        parser::feed(&mut request, &raw[..split]);
        parser::feed(&mut request, &raw[split..]);
        assert_same_request(&reference, &request);
    }
}
