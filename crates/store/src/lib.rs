//! Object-storage boundary.
//!
//! [`ObjectStore`] is implemented by the app over the real storage
//! backend; using a trait keeps upload and gallery logic decoupled from
//! transport and testable with mocks. [`MemoryStore`] is an in-process
//! implementation used by tests and offline tooling.

mod memory;

pub use memory::MemoryStore;

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Boxed future returned by [`ObjectStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Errors surfaced by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("chunk checksum mismatch for {0}")]
    ChecksumMismatch(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Handle to a remote object returned by enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHandle {
    /// Object file name (last path segment).
    pub name: String,
    /// Full remote path.
    pub path: String,
}

/// Per-object metadata, fallible independently of the object itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMeta {
    pub size: u64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
///
/// The chunk checksum convention shared by producers and backends; an
/// empty checksum string means "no verification".
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Abstract object-storage backend.
///
/// Uploads are resumable sessions driven by the caller: `begin_upload`,
/// any number of `put_chunk`s at increasing offsets, then
/// `commit_upload`. A cancelled transfer may leave an uncommitted
/// partial object behind; `list` must not surface those and `delete`
/// must tolerate them.
pub trait ObjectStore: Send + Sync {
    /// Opens a resumable upload session for `path`.
    fn begin_upload(
        &self,
        path: &str,
        content_type: &str,
        total_size: u64,
    ) -> StoreFuture<'_, ()>;

    /// Appends one chunk at `offset`. `checksum` is the SHA-256 hex
    /// digest of `data`, or empty to skip verification.
    fn put_chunk(
        &self,
        path: &str,
        offset: u64,
        data: &[u8],
        checksum: &str,
    ) -> StoreFuture<'_, ()>;

    /// Finalizes the session; the object becomes visible to `list`.
    fn commit_upload(&self, path: &str) -> StoreFuture<'_, ()>;

    /// Resolves the public URL of a committed object.
    fn resolve_url(&self, path: &str) -> StoreFuture<'_, String>;

    fn delete(&self, path: &str) -> StoreFuture<'_, ()>;

    /// Enumerates committed objects under `prefix`.
    fn list(&self, prefix: &str) -> StoreFuture<'_, Vec<ObjectHandle>>;

    fn metadata(&self, path: &str) -> StoreFuture<'_, ObjectMeta>;
}
