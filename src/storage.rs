use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// StorageError
///
/// Failure type for upload-storage operations. Surfaced to the caller like
/// any other storage failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload storage error: {0}")]
    Io(#[from] std::io::Error),
}

// 1. StorageService Contract
/// StorageService
///
/// The abstract contract for persisting uploaded photos. The concrete
/// implementation writes to the configured upload directory; the mock keeps
/// everything in memory for tests.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the upload location exists. Safe to call at startup.
    async fn ensure_upload_dir(&self) -> Result<(), StorageError>;

    /// Persists one uploaded photo under a sanitized version of its client
    /// filename, returning the name it was stored under. Filename collisions
    /// are not deduplicated; the last write wins.
    async fn save_photo(&self, filename: &str, bytes: &[u8]) -> Result<String, StorageError>;
}

/// StorageState
///
/// The concrete type used to share the storage service across the
/// application state.
pub type StorageState = Arc<dyn StorageService>;

// 2. The Real Implementation (local disk)
/// LocalDiskStorage
///
/// Writes uploads into a single configured directory, from which they are
/// served back under `/uploads`.
#[derive(Clone)]
pub struct LocalDiskStorage {
    upload_dir: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(upload_dir: PathBuf) -> Self {
        Self { upload_dir }
    }
}

#[async_trait]
impl StorageService for LocalDiskStorage {
    async fn ensure_upload_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        Ok(())
    }

    async fn save_photo(&self, filename: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let name = sanitize_filename(filename);
        let path = self.upload_dir.join(&name);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(file = %name, size = bytes.len(), "photo stored");
        Ok(name)
    }
}

/// sanitize_filename
///
/// Reduces a client-supplied filename to a single safe path component:
/// directory navigation is stripped and anything outside a conservative
/// character set becomes an underscore.
pub fn sanitize_filename(filename: &str) -> String {
    let last = filename
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .next_back()
        .unwrap_or("");

    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches(['.', '_']).is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// In-memory stand-in for the disk storage, recording every save so tests
/// can assert on what would have been written.
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    saved: Mutex<Vec<String>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self {
            should_fail: false,
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Filenames recorded by `save_photo`, in call order.
    pub fn saved_files(&self) -> Vec<String> {
        self.saved.lock().expect("mock storage lock").clone()
    }
}

impl Default for MockStorageService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_upload_dir(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn save_photo(&self, filename: &str, _bytes: &[u8]) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Io(std::io::Error::other(
                "mock storage failure requested",
            )));
        }
        let name = sanitize_filename(filename);
        self.saved
            .lock()
            .expect("mock storage lock")
            .push(name.clone());
        Ok(name)
    }
}
