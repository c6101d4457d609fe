use std::fmt;
use std::sync::Arc;

use crate::metrics::ServerMetrics;

/// Capacity floor for the first allocation. Most small buffers hold header
/// lines or short bodies, so starting at 128 avoids a cascade of tiny grows.
const CAPACITY_FLOOR: usize = 128;

/// A growable byte buffer with amortized power-of-two growth.
///
/// `GrowBuf` is the substrate for response bodies, composed header blocks,
/// and request bodies. Capacity grows on demand to the smallest power of two
/// that fits the required size (floor 128), so repeated small appends are
/// O(1) amortized. After any append the capacity is strictly greater than
/// the length; a buffer that was never written has capacity 0.
///
/// When created through [`GrowBuf::with_metrics`], allocations,
/// reallocations, frees, and total bytes reserved are counted in the shared
/// [`ServerMetrics`]. Contents are released on drop.
///
/// # Example
///
/// ```
/// use ember::buffer::GrowBuf;
///
/// let mut buf = GrowBuf::new();
/// buf.append(b"hello");
/// buf.append_byte(b' ');
/// buf.append_format(format_args!("world {}", 42));
/// assert_eq!(buf.as_bytes(), b"hello world 42");
/// assert_eq!(buf.capacity(), 128);
/// ```
#[derive(Default)]
pub struct GrowBuf {
    data: Vec<u8>,
    capacity: usize,
    metrics: Option<Arc<ServerMetrics>>,
}

impl GrowBuf {
    /// Creates an empty buffer with zero capacity. Nothing is allocated
    /// until the first write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer that reports allocation activity to the
    /// given metrics.
    pub fn with_metrics(metrics: Arc<ServerMetrics>) -> Self {
        Self {
            data: Vec::new(),
            capacity: 0,
            metrics: Some(metrics),
        }
    }

    /// Creates a buffer whose capacity is exactly `capacity`, bypassing the
    /// power-of-two policy. Used for request bodies (sized by
    /// `Content-Length`) and pre-sized response bodies.
    pub fn with_exact_capacity(capacity: usize) -> Self {
        let mut buf = Self::default();
        if capacity > 0 {
            buf.data.reserve_exact(capacity);
            buf.capacity = capacity;
        }
        buf
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The buffer's logical capacity under the growth policy. A power of
    /// two ≥ 128 once anything has been appended (exact-capacity buffers
    /// excepted).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Replaces the contents entirely.
    pub fn set_contents(&mut self, bytes: &[u8]) {
        self.data.clear();
        self.append(bytes);
    }

    pub fn append_byte(&mut self, byte: u8) {
        self.reserve(1);
        self.data.push(byte);
    }

    pub fn append(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.reserve(bytes.len());
        self.data.extend_from_slice(bytes);
    }

    pub fn append_buf(&mut self, other: &GrowBuf) {
        self.append(other.as_bytes());
    }

    /// Appends formatted text, producing exactly the bytes `format!` would.
    ///
    /// The arguments are formatted twice: once through a counting writer to
    /// learn the exact length, then for real once capacity is guaranteed.
    /// Formatting therefore never truncates, no matter how many times it is
    /// called on the same buffer.
    pub fn append_format(&mut self, args: fmt::Arguments<'_>) {
        let mut counter = CountingWriter(0);
        // Formatting into a counter cannot fail.
        let _ = fmt::Write::write_fmt(&mut counter, args);
        self.reserve(counter.0);
        let _ = fmt::Write::write_fmt(&mut RawWriter(&mut self.data), args);
    }

    /// Appends at most `capacity - length` bytes, never growing. Returns
    /// how many were taken. Used by the parser to fill exact-capacity body
    /// buffers.
    pub(crate) fn extend_within_capacity(&mut self, bytes: &[u8]) -> usize {
        let room = self.capacity.saturating_sub(self.data.len());
        let take = room.min(bytes.len());
        self.data.extend_from_slice(&bytes[..take]);
        take
    }

    /// Ensures room for `additional` bytes plus one spare, growing to the
    /// next power of two (floor 128) if needed.
    fn reserve(&mut self, additional: usize) {
        let required = self.data.len() + additional + 1;
        if required <= self.capacity {
            return;
        }
        let previously_allocated = self.capacity > 0;
        let new_capacity = next_allocation_size(required);
        self.data.reserve(new_capacity - self.data.len());
        self.capacity = new_capacity;
        if let Some(metrics) = &self.metrics {
            metrics.record_buffer_grow(previously_allocated, new_capacity);
        }
    }
}

impl Drop for GrowBuf {
    fn drop(&mut self) {
        if self.capacity > 0 {
            if let Some(metrics) = &self.metrics {
                metrics.record_buffer_free();
            }
        }
    }
}

impl fmt::Write for GrowBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append(s.as_bytes());
        Ok(())
    }
}

impl fmt::Debug for GrowBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowBuf")
            .field("len", &self.data.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Smallest power of two ≥ `required`, starting at the 128-byte floor.
fn next_allocation_size(required: usize) -> usize {
    let mut capacity = CAPACITY_FLOOR;
    while capacity < required {
        capacity *= 2;
    }
    capacity
}

/// fmt::Write sink that only counts bytes (the trial formatting pass).
struct CountingWriter(usize);

impl fmt::Write for CountingWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

/// fmt::Write sink that pushes straight into the backing vec, without
/// re-entering the growth policy (capacity is already reserved).
struct RawWriter<'a>(&'a mut Vec<u8>);

impl fmt::Write for RawWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.extend_from_slice(s.as_bytes());
        Ok(())
    }
}
