//! Batch coordination for multi-file uploads.
//!
//! One engine task per file, all started immediately; member events are
//! merged onto a single channel so the aggregate has exactly one
//! writer. The batch settles only once every member is terminal.

use std::collections::HashMap;
use std::sync::Arc;

use pixvault_intake::CandidateFile;
use pixvault_stats::{LifecycleEvent, notify};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::engine::UploadEngine;
use crate::types::{UploadEvent, UploadOutcome, UploadStatus};

/// Event published by a batch: a member transfer event, or the
/// recomputed aggregate fraction after that member update.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Upload(UploadEvent),
    Progress { fraction: f64 },
}

/// Coordinates one multi-file upload action.
pub struct BatchUploader {
    engine: UploadEngine,
    events_tx: mpsc::UnboundedSender<BatchEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<BatchEvent>>,
    cancel: CancellationToken,
}

impl BatchUploader {
    pub fn new(engine: UploadEngine) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<BatchEvent>> {
        self.events_rx.take()
    }

    /// Returns the batch cancellation token.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancels every still-in-flight member; finished members keep
    /// their results.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Uploads every file concurrently and settles once all members
    /// are terminal.
    ///
    /// Never fail-fast: a member failure is reported in its outcome and
    /// its siblings run to completion. Outcomes keep the input order.
    pub async fn upload(&self, files: Vec<CandidateFile>) -> Vec<UploadOutcome> {
        if files.is_empty() {
            return Vec::new();
        }

        let total_bytes: u64 = files.iter().map(CandidateFile::size).sum();
        notify(
            self.engine.sinks(),
            LifecycleEvent::BatchStarted {
                files: files.len(),
                total_bytes,
            },
        );

        let (member_tx, mut member_rx) = mpsc::channel::<UploadEvent>(256);
        let mut fractions: HashMap<String, f64> = HashMap::new();
        let mut handles = Vec::with_capacity(files.len());

        for (index, file) in files.into_iter().enumerate() {
            let id = format!("file_{index}_{}", chrono::Utc::now().timestamp_millis());
            fractions.insert(id.clone(), 0.0);
            handles.push(self.engine.start_with_id(
                id,
                file,
                member_tx.clone(),
                self.cancel.child_token(),
            ));
        }
        drop(member_tx);

        // Single writer of the aggregate: every member event funnels
        // through this loop, one at a time.
        let mut remaining = handles.len();
        while remaining > 0 {
            let Some(event) = member_rx.recv().await else {
                break;
            };

            match &event {
                UploadEvent::Progress { id, fraction } => {
                    fractions.insert(id.clone(), *fraction);
                }
                UploadEvent::Completed { id, .. } => {
                    fractions.insert(id.clone(), 100.0);
                    remaining -= 1;
                }
                // Failed and cancelled members freeze at their last
                // reported fraction.
                UploadEvent::Failed { .. } | UploadEvent::Cancelled { .. } => {
                    remaining -= 1;
                }
            }

            let overall = mean(&fractions);
            let _ = self.events_tx.send(BatchEvent::Upload(event));
            let _ = self.events_tx.send(BatchEvent::Progress { fraction: overall });
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(handle.join().await);
        }

        let completed = count_status(&outcomes, UploadStatus::Completed);
        let failed = count_status(&outcomes, UploadStatus::Failed);
        let cancelled = count_status(&outcomes, UploadStatus::Cancelled);
        notify(
            self.engine.sinks(),
            LifecycleEvent::BatchSettled {
                completed,
                failed,
                cancelled,
            },
        );
        info!(
            total = outcomes.len(),
            completed, failed, cancelled, "batch settled"
        );

        outcomes
    }
}

fn mean(fractions: &HashMap<String, f64>) -> f64 {
    if fractions.is_empty() {
        return 0.0;
    }
    fractions.values().sum::<f64>() / fractions.len() as f64
}

fn count_status(outcomes: &[UploadOutcome], status: UploadStatus) -> usize {
    outcomes.iter().filter(|o| o.status == status).count()
}
