//! The per-file transfer engine.
//!
//! One spawned task per transfer: pre-flight guard, chunked byte
//! transfer with ordered progress emissions, then a terminal
//! completed/failed/cancelled event.

use std::sync::Arc;

use pixvault_intake::CandidateFile;
use pixvault_stats::{EventSink, LifecycleEvent, notify};
use pixvault_store::{ObjectStore, StoreFuture, checksum_bytes};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::types::{UploadEvent, UploadOptions, UploadOutcome, UploadRecord};
use crate::UploadError;

/// Starts and tracks individual file transfers.
pub struct UploadEngine {
    store: Arc<dyn ObjectStore>,
    options: UploadOptions,
    sinks: Vec<Arc<dyn EventSink>>,
}

impl UploadEngine {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            options: UploadOptions::default(),
            sinks: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers a lifecycle observer; observers are notified at
    /// discrete points and never awaited.
    pub fn add_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    pub(crate) fn sinks(&self) -> &[Arc<dyn EventSink>] {
        &self.sinks
    }

    /// Starts one transfer. Progress events arrive on `events_tx`; the
    /// returned handle cancels or joins the transfer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        &self,
        file: CandidateFile,
        events_tx: mpsc::Sender<UploadEvent>,
    ) -> UploadHandle {
        let id = format!("file_0_{}", chrono::Utc::now().timestamp_millis());
        self.start_with_id(id, file, events_tx, CancellationToken::new())
    }

    /// Starts one transfer under a caller-chosen id and cancellation
    /// token; used by the batch coordinator to wire members to a shared
    /// parent token.
    pub fn start_with_id(
        &self,
        id: String,
        file: CandidateFile,
        events_tx: mpsc::Sender<UploadEvent>,
        cancel: CancellationToken,
    ) -> UploadHandle {
        let record = Arc::new(UploadRecord::new(id.clone(), file.name.clone(), file.size()));
        let task = tokio::spawn(run_upload(
            Arc::clone(&self.store),
            self.options.clone(),
            self.sinks.to_vec(),
            file,
            Arc::clone(&record),
            events_tx,
            cancel.clone(),
        ));

        UploadHandle {
            id,
            record,
            cancel,
            task,
        }
    }
}

/// Handle to one spawned transfer.
pub struct UploadHandle {
    id: String,
    record: Arc<UploadRecord>,
    cancel: CancellationToken,
    task: JoinHandle<UploadOutcome>,
}

impl UploadHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Live record for progress snapshots.
    pub fn record(&self) -> Arc<UploadRecord> {
        Arc::clone(&self.record)
    }

    /// Requests cooperative abort of the transfer.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the terminal outcome.
    pub async fn join(self) -> UploadOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.record.fail(format!("transfer task failed: {err}"));
                self.record.outcome()
            }
        }
    }
}

async fn run_upload(
    store: Arc<dyn ObjectStore>,
    options: UploadOptions,
    sinks: Vec<Arc<dyn EventSink>>,
    file: CandidateFile,
    record: Arc<UploadRecord>,
    events: mpsc::Sender<UploadEvent>,
    cancel: CancellationToken,
) -> UploadOutcome {
    let id = record.id();
    record.start();

    // Defense in depth: the caller is expected to have validated
    // already, but nothing starts a network transfer unchecked.
    if let Err(err) = preflight(&file, &options) {
        record.fail(err.to_string());
        error!(id = %id, error = %err, "upload rejected before transfer");
        let _ = events
            .send(UploadEvent::Failed {
                id: id.clone(),
                error: err.to_string(),
            })
            .await;
        notify(&sinks, LifecycleEvent::UploadFailed);
        return record.outcome();
    }

    let remote_path = object_path(&options.dest_prefix, &file.name);
    record.set_remote_path(remote_path.clone());

    let total_bytes = file.size();
    notify(&sinks, LifecycleEvent::UploadStarted { bytes: total_bytes });
    debug!(id = %id, path = %remote_path, bytes = total_bytes, "starting transfer");

    match transfer(store.as_ref(), &options, &file, &remote_path, &record, &events, &cancel).await
    {
        Ok(url) => {
            record.complete(url.clone());
            info!(id = %id, path = %remote_path, "upload completed");
            let _ = events
                .send(UploadEvent::Completed {
                    id: id.clone(),
                    url,
                })
                .await;
            notify(&sinks, LifecycleEvent::UploadCompleted { bytes: total_bytes });
        }
        Err(UploadError::Cancelled) => {
            record.cancel();
            debug!(id = %id, "upload cancelled");
            let _ = events.send(UploadEvent::Cancelled { id: id.clone() }).await;
            notify(&sinks, LifecycleEvent::UploadCancelled);
        }
        Err(err) => {
            record.fail(err.to_string());
            error!(id = %id, error = %err, "upload failed");
            let _ = events
                .send(UploadEvent::Failed {
                    id: id.clone(),
                    error: err.to_string(),
                })
                .await;
            notify(&sinks, LifecycleEvent::UploadFailed);
        }
    }

    record.outcome()
}

/// Streams the file's bytes and returns the public URL.
async fn transfer(
    store: &dyn ObjectStore,
    options: &UploadOptions,
    file: &CandidateFile,
    remote_path: &str,
    record: &UploadRecord,
    events: &mpsc::Sender<UploadEvent>,
    cancel: &CancellationToken,
) -> Result<String, UploadError> {
    if cancel.is_cancelled() {
        return Err(UploadError::Cancelled);
    }

    let total = file.size();
    run_cancellable(
        cancel,
        store.begin_upload(remote_path, &file.content_type, total),
    )
    .await?;

    let mut offset: u64 = 0;
    let mut last_fraction = 0.0f64;
    for chunk in file.data.chunks(options.effective_chunk_size()) {
        let checksum = checksum_bytes(chunk);
        run_cancellable(cancel, store.put_chunk(remote_path, offset, chunk, &checksum)).await?;

        offset += chunk.len() as u64;
        record.add_transferred(chunk.len() as u64);

        // Monotonic and capped; the terminal event carries the final 100.
        let fraction = (offset as f64 / total as f64 * 100.0)
            .min(100.0)
            .max(last_fraction);
        last_fraction = fraction;
        if fraction < 100.0 {
            let _ = events
                .send(UploadEvent::Progress {
                    id: record.id(),
                    fraction,
                })
                .await;
        }
    }

    run_cancellable(cancel, store.commit_upload(remote_path)).await?;
    run_cancellable(cancel, store.resolve_url(remote_path)).await
}

/// Awaits a backend call, aborting it if cancellation lands first.
async fn run_cancellable<T>(
    cancel: &CancellationToken,
    operation: StoreFuture<'_, T>,
) -> Result<T, UploadError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(UploadError::Cancelled),
        result = operation => result.map_err(UploadError::from),
    }
}

fn preflight(file: &CandidateFile, options: &UploadOptions) -> Result<(), UploadError> {
    if !file.is_image() {
        return Err(UploadError::UnsupportedType {
            name: file.name.clone(),
        });
    }
    if file.size() > options.max_file_size {
        return Err(UploadError::FileTooLarge {
            name: file.name.clone(),
        });
    }
    if file.size() == 0 {
        return Err(UploadError::EmptyFile {
            name: file.name.clone(),
        });
    }
    Ok(())
}

/// Builds the remote object path for one upload.
///
/// `timestamp_filename` alone collides when same-named files start in
/// one clock tick; the random token de-duplicates them.
fn object_path(prefix: &str, file_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let token = uuid::Uuid::new_v4().simple().to_string();
    let token = &token[..8];
    if prefix.is_empty() {
        format!("{millis}_{token}_{file_name}")
    } else {
        format!("{prefix}/{millis}_{token}_{file_name}")
    }
}
