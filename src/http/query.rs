//! Form/query parameter decoding and HTML escaping.
//!
//! These implement the exact semantics request handlers rely on:
//! `+` means space, `%XX` is a hex-escaped byte, and a parameter value runs
//! from its `=` to the next `&` or the end of the string.

use tracing::warn;

/// Decodes the value of `name` out of `source`, which may be a request path
/// (GET) or a form body (POST).
///
/// Returns `None` when the parameter is absent; callers supply their own
/// default with `unwrap_or`. An empty value decodes to an empty string.
/// Decoded bytes that are not valid UTF-8 are replaced lossily.
pub fn decode_param(source: &str, name: &str) -> Option<String> {
    let marker = format!("{name}=");
    let start = source.find(&marker)? + marker.len();
    let raw = &source[start..];

    let mut decoded: Vec<u8> = Vec::with_capacity(raw.len());
    let mut bytes = raw.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'&' => break,
            b'+' => decoded.push(b' '),
            b'%' => {
                let hi = bytes.next();
                let lo = bytes.next();
                match (hi.and_then(hex_value), lo.and_then(hex_value)) {
                    (Some(hi), Some(lo)) => decoded.push(hi << 4 | lo),
                    _ => warn!(param = name, "bad percent escape in parameter, skipping"),
                }
            }
            _ => decoded.push(b),
        }
    }
    Some(String::from_utf8_lossy(&decoded).into_owned())
}

/// Decodes `%XX` escapes only, leaving `+` alone. Suitable for request
/// paths, where `+` is a literal plus.
pub fn percent_decode(s: &str) -> String {
    let mut decoded: Vec<u8> = Vec::with_capacity(s.len());
    let mut bytes = s.bytes();
    while let Some(b) = bytes.next() {
        if b == b'%' {
            let hi = bytes.next();
            let lo = bytes.next();
            match (hi.and_then(hex_value), lo.and_then(hex_value)) {
                (Some(hi), Some(lo)) => decoded.push(hi << 4 | lo),
                _ => warn!("bad percent escape in path, skipping"),
            }
        } else {
            decoded.push(b);
        }
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Escapes text for embedding in HTML (e.g. echoing user input back into a
/// `value=""` attribute).
///
/// Space becomes `&nbsp;`, `&` `&amp;`, `"` `&quot;`, `'` `&#039;`,
/// `<` `&lt;`, `>` `&gt;`; everything else passes through unchanged.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => escaped.push_str("&quot;"),
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&#039;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            ' ' => escaped.push_str("&nbsp;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
