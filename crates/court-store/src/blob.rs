//! Evidence file storage

use court_domain::traits::BlobStore;
use court_domain::BlobRef;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Longest stored file-name suffix, in characters
const MAX_NAME_CHARS: usize = 100;

/// Errors that can occur while storing or reading evidence files
#[derive(Error, Debug)]
pub enum BlobError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The handle could not have been issued by this store
    #[error("Invalid blob handle: {0}")]
    InvalidHandle(String),

    /// Internal lock was poisoned
    #[error("Blob store lock poisoned")]
    Poisoned,
}

/// Reduce an uploaded file name to characters safe for a single path segment
fn sanitize_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .take(MAX_NAME_CHARS)
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "evidence".to_string()
    } else {
        cleaned
    }
}

/// Unique handle: a fresh UUIDv7 followed by the sanitized name
fn issue_handle(name: &str) -> String {
    format!("{}-{}", uuid::Uuid::now_v7().simple(), sanitize_name(name))
}

fn check_handle(blob: &BlobRef) -> Result<&str, BlobError> {
    let handle = blob.as_str();
    let valid = !handle.is_empty()
        && !handle.starts_with('.')
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if valid {
        Ok(handle)
    } else {
        Err(BlobError::InvalidHandle(handle.to_string()))
    }
}

/// Stores evidence files as plain files under one directory
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Use `root` for evidence files, creating it if needed
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, BlobError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the files
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BlobStore for FsBlobStore {
    type Error = BlobError;

    fn put(&self, name: &str, bytes: &[u8]) -> Result<BlobRef, Self::Error> {
        let handle = issue_handle(name);
        fs::write(self.root.join(&handle), bytes)?;
        Ok(BlobRef::new(handle))
    }

    fn get(&self, blob: &BlobRef) -> Result<Option<Vec<u8>>, Self::Error> {
        let handle = check_handle(blob)?;
        match fs::read(self.root.join(handle)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, blob: &BlobRef) -> Result<bool, Self::Error> {
        let handle = check_handle(blob)?;
        match fs::remove_file(self.root.join(handle)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps evidence files in memory (tests and throwaway instances)
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files
    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    type Error = BlobError;

    fn put(&self, name: &str, bytes: &[u8]) -> Result<BlobRef, Self::Error> {
        let handle = issue_handle(name);
        self.blobs
            .lock()
            .map_err(|_| BlobError::Poisoned)?
            .insert(handle.clone(), bytes.to_vec());
        Ok(BlobRef::new(handle))
    }

    fn get(&self, blob: &BlobRef) -> Result<Option<Vec<u8>>, Self::Error> {
        let handle = check_handle(blob)?;
        let blobs = self.blobs.lock().map_err(|_| BlobError::Poisoned)?;
        Ok(blobs.get(handle).cloned())
    }

    fn delete(&self, blob: &BlobRef) -> Result<bool, Self::Error> {
        let handle = check_handle(blob)?;
        let mut blobs = self.blobs.lock().map_err(|_| BlobError::Poisoned)?;
        Ok(blobs.remove(handle).is_some())
    }
}
