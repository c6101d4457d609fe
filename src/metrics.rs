//! Process-wide counters, shared by injection rather than globals.
//!
//! Every connection handler and metrics-aware buffer holds an
//! `Arc<ServerMetrics>` and updates it with atomic operations, so counters
//! stay consistent under concurrency and never go negative (active
//! connection increments and decrements are strictly paired).

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Shared diagnostic counters for a running server.
///
/// Exposed read-only through [`snapshot`](Self::snapshot); not a stable API
/// contract.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    active_connections: AtomicI64,
    total_connections: AtomicU64,
    bytes_received: AtomicU64,
    bytes_sent: AtomicU64,
    buffer_allocations: AtomicU64,
    buffer_reallocations: AtomicU64,
    buffer_frees: AtomicU64,
    buffer_bytes_reserved: AtomicU64,
}

/// A point-in-time copy of the counters, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub active_connections: i64,
    pub total_connections: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub buffer_allocations: u64,
    pub buffer_reallocations: u64,
    pub buffer_frees: u64,
    pub buffer_bytes_reserved: u64,
}

impl ServerMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn add_bytes_received(&self, n: u64) {
        self.bytes_received.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_bytes_sent(&self, n: u64) {
        self.bytes_sent.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_buffer_grow(&self, previously_allocated: bool, new_capacity: usize) {
        if previously_allocated {
            self.buffer_reallocations.fetch_add(1, Ordering::Relaxed);
        } else {
            self.buffer_allocations.fetch_add(1, Ordering::Relaxed);
        }
        self.buffer_bytes_reserved
            .fetch_add(new_capacity as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_buffer_free(&self) {
        self.buffer_frees.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_connections: self.active_connections.load(Ordering::Relaxed),
            total_connections: self.total_connections.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            buffer_allocations: self.buffer_allocations.load(Ordering::Relaxed),
            buffer_reallocations: self.buffer_reallocations.load(Ordering::Relaxed),
            buffer_frees: self.buffer_frees.load(Ordering::Relaxed),
            buffer_bytes_reserved: self.buffer_bytes_reserved.load(Ordering::Relaxed),
        }
    }
}
