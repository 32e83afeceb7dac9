use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::DEFAULT_CHUNK_SIZE;

/// Current state of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl UploadStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            UploadStatus::Completed | UploadStatus::Failed | UploadStatus::Cancelled
        )
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadOptions {
    /// Remote prefix new objects are uploaded under.
    pub dest_prefix: String,
    /// Transfer chunk size in bytes; 0 selects the default.
    pub chunk_size: usize,
    /// Upper size bound re-checked before any transfer starts.
    pub max_file_size: u64,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            dest_prefix: "images".into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_file_size: pixvault_intake::MAX_FILE_SIZE,
        }
    }
}

impl UploadOptions {
    pub(crate) fn effective_chunk_size(&self) -> usize {
        if self.chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            self.chunk_size
        }
    }
}

/// Event emitted by one transfer.
///
/// Per transfer, events are strictly ordered: zero or more `Progress`
/// emissions with non-decreasing fractions below 100, then exactly one
/// terminal variant. `Completed` is the single 100%-carrying emission.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Progress { id: String, fraction: f64 },
    Completed { id: String, url: String },
    Failed { id: String, error: String },
    Cancelled { id: String },
}

impl UploadEvent {
    pub fn id(&self) -> &str {
        match self {
            UploadEvent::Progress { id, .. }
            | UploadEvent::Completed { id, .. }
            | UploadEvent::Failed { id, .. }
            | UploadEvent::Cancelled { id } => id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, UploadEvent::Progress { .. })
    }
}

/// Terminal result of one transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub id: String,
    pub file_name: String,
    pub remote_path: String,
    pub status: UploadStatus,
    pub url: Option<String>,
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == UploadStatus::Completed
    }
}

/// Live state of one transfer (thread-safe snapshots).
pub struct UploadRecord {
    inner: RwLock<RecordInner>,
}

struct RecordInner {
    id: String,
    file_name: String,
    remote_path: String,
    total_bytes: u64,
    transferred_bytes: u64,
    status: UploadStatus,
    url: Option<String>,
    error: Option<String>,
}

impl UploadRecord {
    /// Creates a pending record for one file.
    pub fn new(id: String, file_name: String, total_bytes: u64) -> Self {
        Self {
            inner: RwLock::new(RecordInner {
                id,
                file_name,
                remote_path: String::new(),
                total_bytes,
                transferred_bytes: 0,
                status: UploadStatus::Pending,
                url: None,
                error: None,
            }),
        }
    }

    pub(crate) fn start(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.status = UploadStatus::InProgress;
    }

    pub(crate) fn set_remote_path(&self, path: String) {
        let mut inner = self.inner.write().unwrap();
        inner.remote_path = path;
    }

    pub(crate) fn add_transferred(&self, bytes: u64) {
        let mut inner = self.inner.write().unwrap();
        inner.transferred_bytes += bytes;
    }

    pub(crate) fn complete(&self, url: String) {
        let mut inner = self.inner.write().unwrap();
        inner.status = UploadStatus::Completed;
        inner.url = Some(url);
    }

    pub(crate) fn fail(&self, error: String) {
        let mut inner = self.inner.write().unwrap();
        inner.status = UploadStatus::Failed;
        inner.error = Some(error);
    }

    pub(crate) fn cancel(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.status = UploadStatus::Cancelled;
    }

    pub fn id(&self) -> String {
        self.inner.read().unwrap().id.clone()
    }

    pub fn file_name(&self) -> String {
        self.inner.read().unwrap().file_name.clone()
    }

    pub fn remote_path(&self) -> String {
        self.inner.read().unwrap().remote_path.clone()
    }

    pub fn status(&self) -> UploadStatus {
        self.inner.read().unwrap().status
    }

    pub fn url(&self) -> Option<String> {
        self.inner.read().unwrap().url.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.read().unwrap().error.clone()
    }

    /// Progress as a fraction in `[0, 100]`.
    pub fn progress_fraction(&self) -> f64 {
        let inner = self.inner.read().unwrap();
        if inner.total_bytes == 0 {
            return 0.0;
        }
        (inner.transferred_bytes as f64 / inner.total_bytes as f64 * 100.0).min(100.0)
    }

    /// Snapshot of the terminal result.
    pub fn outcome(&self) -> UploadOutcome {
        let inner = self.inner.read().unwrap();
        UploadOutcome {
            id: inner.id.clone(),
            file_name: inner.file_name.clone(),
            remote_path: inner.remote_path.clone(),
            status: inner.status,
            url: inner.url.clone(),
            error: inner.error.clone(),
        }
    }
}
