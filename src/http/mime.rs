//! Best-effort MIME classification for served files.

/// How many leading bytes the sniffer looks at.
pub const SNIFF_SIZE: usize = 100;

const PNG_MAGIC: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];
const GIF_MAGIC: [u8; 3] = *b"GIF";
const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];

/// Picks a MIME type for a file from its name and leading bytes.
///
/// Order of checks, first match wins: magic-byte signatures (PNG, GIF,
/// JPEG), file extension, then an ASCII sniff of up to the first
/// [`SNIFF_SIZE`] bytes (all ≤127 classifies as `text/plain`). Anything
/// else is `application/binary`. Best effort, not authoritative.
pub fn mime_type_for(filename: &str, contents: &[u8]) -> &'static str {
    if contents.starts_with(&PNG_MAGIC) {
        return "image/png";
    }
    if contents.starts_with(&GIF_MAGIC) {
        return "image/gif";
    }
    if contents.starts_with(&JPEG_MAGIC) {
        return "image/jpeg";
    }
    if filename.ends_with("html") || filename.ends_with("htm") {
        return "text/html";
    }
    if filename.ends_with("css") {
        return "text/css";
    }
    if filename.ends_with("gz") {
        return "application/x-gzip";
    }
    if filename.ends_with("js") {
        return "application/javascript";
    }
    let sample = &contents[..contents.len().min(SNIFF_SIZE)];
    if sample.iter().all(|&b| b <= 127) {
        return "text/plain";
    }
    "application/binary"
}
