//! Asset gallery over the object-storage boundary.
//!
//! Read/delete façade consumed after a batch completes to refresh the
//! visible collection. Listing is fail-soft per object: a missing piece
//! of metadata degrades to placeholders instead of dropping the object,
//! while a failure of the enumeration itself surfaces as a typed error
//! so the caller can tell "no images yet" from "storage unreachable".

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use pixvault_stats::{EventSink, LifecycleEvent, notify};
use pixvault_store::{ObjectHandle, ObjectStore, StoreError};
use serde::Serialize;
use tracing::{info, warn};

/// Lifecycle state of an asset as shown in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssetStatus {
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "error")]
    Error,
}

/// A stored image as seen by the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Derived from the storage object's name; not guaranteed globally
    /// unique across concurrent uploads with colliding names.
    pub id: String,
    pub name: String,
    pub url: String,
    pub size_kb: u64,
    pub content_type: String,
    pub remote_path: String,
    pub uploaded_at: DateTime<Utc>,
    pub status: AssetStatus,
}

/// Errors surfaced by the gallery.
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    /// The enumeration itself failed; distinct from an empty listing.
    #[error("listing unavailable: {0}")]
    ListingUnavailable(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read/delete façade over stored assets.
pub struct AssetGallery {
    store: Arc<dyn ObjectStore>,
    sinks: Vec<Arc<dyn EventSink>>,
}

impl AssetGallery {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            sinks: Vec::new(),
        }
    }

    /// Registers a lifecycle observer.
    pub fn add_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Enumerates assets under `prefix`.
    ///
    /// Objects resolve their URL and metadata concurrently. Metadata
    /// failures degrade to placeholders; an object whose URL cannot be
    /// resolved is skipped with a warning.
    pub async fn list(&self, prefix: &str) -> Result<Vec<Asset>, GalleryError> {
        let handles = self
            .store
            .list(prefix)
            .await
            .map_err(GalleryError::ListingUnavailable)?;

        let assets = join_all(handles.into_iter().map(|handle| self.load_asset(handle))).await;
        Ok(assets.into_iter().flatten().collect())
    }

    async fn load_asset(&self, handle: ObjectHandle) -> Option<Asset> {
        let url = match self.store.resolve_url(&handle.path).await {
            Ok(url) => url,
            Err(err) => {
                warn!(path = %handle.path, error = %err, "skipping object with unresolvable url");
                return None;
            }
        };

        let (size_kb, content_type, uploaded_at) = match self.store.metadata(&handle.path).await {
            Ok(meta) => (meta.size.div_ceil(1024), meta.content_type, meta.created_at),
            Err(err) => {
                warn!(path = %handle.path, error = %err, "metadata unavailable, using placeholders");
                (0, "image".to_string(), Utc::now())
            }
        };

        Some(Asset {
            id: handle.name.clone(),
            name: handle.name,
            url,
            size_kb,
            content_type,
            remote_path: handle.path,
            uploaded_at,
            status: AssetStatus::Completed,
        })
    }

    /// Deletes one asset by remote path.
    pub async fn delete(&self, path: &str) -> Result<(), GalleryError> {
        self.store.delete(path).await?;
        info!(path = %path, "deleted asset");
        notify(&self.sinks, LifecycleEvent::AssetDeleted);
        Ok(())
    }

    /// Resolves the public URL for a stored object.
    pub async fn resolve_url(&self, path: &str) -> Result<String, GalleryError> {
        Ok(self.store.resolve_url(path).await?)
    }
}
