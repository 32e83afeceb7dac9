//! Lifecycle observation: discrete core events and counter aggregates.
//!
//! Settings panels, analytics and similar collaborators are read-only
//! observers — the core notifies them at discrete points and never
//! depends on them succeeding.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Discrete core lifecycle event, fanned out to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    UploadStarted { bytes: u64 },
    UploadCompleted { bytes: u64 },
    UploadFailed,
    UploadCancelled,
    BatchStarted { files: usize, total_bytes: u64 },
    BatchSettled {
        completed: usize,
        failed: usize,
        cancelled: usize,
    },
    AssetDeleted,
}

/// Read-only observer of core lifecycle events.
///
/// `record` is infallible and must return promptly; the core never
/// waits on an observer.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &LifecycleEvent);
}

/// Fans one event out to every registered sink.
pub fn notify(sinks: &[Arc<dyn EventSink>], event: LifecycleEvent) {
    for sink in sinks {
        sink.record(&event);
    }
}

/// Counter aggregate over lifecycle events.
///
/// Owned explicitly and shared by reference with whoever needs to read
/// it; counters only ever increase.
#[derive(Debug, Default)]
pub struct UploadStats {
    uploads_started: AtomicU64,
    uploads_completed: AtomicU64,
    uploads_failed: AtomicU64,
    uploads_cancelled: AtomicU64,
    bytes_transferred: AtomicU64,
    batches_started: AtomicU64,
    assets_deleted: AtomicU64,
}

impl UploadStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time view of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uploads_started: self.uploads_started.load(Ordering::Relaxed),
            uploads_completed: self.uploads_completed.load(Ordering::Relaxed),
            uploads_failed: self.uploads_failed.load(Ordering::Relaxed),
            uploads_cancelled: self.uploads_cancelled.load(Ordering::Relaxed),
            bytes_transferred: self.bytes_transferred.load(Ordering::Relaxed),
            batches_started: self.batches_started.load(Ordering::Relaxed),
            assets_deleted: self.assets_deleted.load(Ordering::Relaxed),
        }
    }
}

impl EventSink for UploadStats {
    fn record(&self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::UploadStarted { .. } => {
                self.uploads_started.fetch_add(1, Ordering::Relaxed);
            }
            LifecycleEvent::UploadCompleted { bytes } => {
                self.uploads_completed.fetch_add(1, Ordering::Relaxed);
                self.bytes_transferred.fetch_add(*bytes, Ordering::Relaxed);
            }
            LifecycleEvent::UploadFailed => {
                self.uploads_failed.fetch_add(1, Ordering::Relaxed);
            }
            LifecycleEvent::UploadCancelled => {
                self.uploads_cancelled.fetch_add(1, Ordering::Relaxed);
            }
            LifecycleEvent::BatchStarted { .. } => {
                self.batches_started.fetch_add(1, Ordering::Relaxed);
            }
            LifecycleEvent::BatchSettled { .. } => {}
            LifecycleEvent::AssetDeleted => {
                self.assets_deleted.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Serializable view of [`UploadStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub uploads_started: u64,
    pub uploads_completed: u64,
    pub uploads_failed: u64,
    pub uploads_cancelled: u64,
    pub bytes_transferred: u64,
    pub batches_started: u64,
    pub assets_deleted: u64,
}
