use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::{ObjectHandle, ObjectMeta, ObjectStore, StoreError, StoreFuture, checksum_bytes};

/// In-process object store backed by a map.
///
/// Verifies chunk offsets and checksums the way a real backend would,
/// and keeps uncommitted uploads invisible to `list` while still
/// letting `delete` clean them up.
pub struct MemoryStore {
    base_url: String,
    objects: RwLock<HashMap<String, StoredObject>>,
}

struct StoredObject {
    data: Vec<u8>,
    content_type: String,
    declared_size: u64,
    created_at: DateTime<Utc>,
    committed: bool,
}

impl MemoryStore {
    /// Creates a store whose public URLs are `{base_url}/{path}`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of committed objects; uncommitted partials are excluded.
    pub fn committed_count(&self) -> usize {
        let objects = self.objects.read().unwrap();
        objects.values().filter(|o| o.committed).count()
    }

    /// True if any object, committed or partial, exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.objects.read().unwrap().contains_key(path)
    }
}

fn object_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

impl ObjectStore for MemoryStore {
    fn begin_upload(
        &self,
        path: &str,
        content_type: &str,
        total_size: u64,
    ) -> StoreFuture<'_, ()> {
        let path = path.to_string();
        let content_type = content_type.to_string();
        Box::pin(async move {
            let mut objects = self.objects.write().unwrap();
            objects.insert(
                path,
                StoredObject {
                    data: Vec::with_capacity(total_size as usize),
                    content_type,
                    declared_size: total_size,
                    created_at: Utc::now(),
                    committed: false,
                },
            );
            Ok(())
        })
    }

    fn put_chunk(
        &self,
        path: &str,
        offset: u64,
        data: &[u8],
        checksum: &str,
    ) -> StoreFuture<'_, ()> {
        let path = path.to_string();
        let data = data.to_vec();
        let checksum = checksum.to_string();
        Box::pin(async move {
            if !checksum.is_empty() && checksum_bytes(&data) != checksum {
                return Err(StoreError::ChecksumMismatch(path));
            }

            let mut objects = self.objects.write().unwrap();
            let object = objects
                .get_mut(&path)
                .ok_or_else(|| StoreError::NotFound(path.clone()))?;

            if object.committed {
                return Err(StoreError::Backend(format!(
                    "object already committed: {path}"
                )));
            }
            if offset != object.data.len() as u64 {
                return Err(StoreError::Backend(format!(
                    "out-of-order chunk at offset {offset} for {path} (expected {})",
                    object.data.len()
                )));
            }

            object.data.extend_from_slice(&data);
            Ok(())
        })
    }

    fn commit_upload(&self, path: &str) -> StoreFuture<'_, ()> {
        let path = path.to_string();
        Box::pin(async move {
            let mut objects = self.objects.write().unwrap();
            let object = objects
                .get_mut(&path)
                .ok_or_else(|| StoreError::NotFound(path.clone()))?;

            if object.data.len() as u64 != object.declared_size {
                return Err(StoreError::Backend(format!(
                    "size mismatch for {path}: declared {}, received {}",
                    object.declared_size,
                    object.data.len()
                )));
            }

            object.committed = true;
            Ok(())
        })
    }

    fn resolve_url(&self, path: &str) -> StoreFuture<'_, String> {
        let path = path.to_string();
        Box::pin(async move {
            let objects = self.objects.read().unwrap();
            match objects.get(&path) {
                Some(object) if object.committed => {
                    Ok(format!("{}/{path}", self.base_url))
                }
                _ => Err(StoreError::NotFound(path)),
            }
        })
    }

    fn delete(&self, path: &str) -> StoreFuture<'_, ()> {
        let path = path.to_string();
        Box::pin(async move {
            let mut objects = self.objects.write().unwrap();
            objects
                .remove(&path)
                .map(|_| ())
                .ok_or(StoreError::NotFound(path))
        })
    }

    fn list(&self, prefix: &str) -> StoreFuture<'_, Vec<ObjectHandle>> {
        let prefix = prefix.to_string();
        Box::pin(async move {
            let objects = self.objects.read().unwrap();
            let mut handles: Vec<ObjectHandle> = objects
                .iter()
                .filter(|(path, object)| {
                    object.committed
                        && (prefix.is_empty()
                            || path.starts_with(&format!("{prefix}/"))
                            || **path == prefix)
                })
                .map(|(path, _)| ObjectHandle {
                    name: object_name(path),
                    path: path.clone(),
                })
                .collect();
            handles.sort_by(|a, b| a.path.cmp(&b.path));
            Ok(handles)
        })
    }

    fn metadata(&self, path: &str) -> StoreFuture<'_, ObjectMeta> {
        let path = path.to_string();
        Box::pin(async move {
            let objects = self.objects.read().unwrap();
            match objects.get(&path) {
                Some(object) if object.committed => Ok(ObjectMeta {
                    size: object.data.len() as u64,
                    content_type: object.content_type.clone(),
                    created_at: object.created_at,
                }),
                _ => Err(StoreError::NotFound(path)),
            }
        })
    }
}
