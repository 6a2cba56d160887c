//! On-disk media storage
//!
//! Owns the gateway's file layout: a `frames/` directory holding the rolling
//! per-device image files and a `scratch/` spool for in-flight query audio.
//! Frame files are referenced through [`StoredFrame`] locators so the
//! orchestration layer never touches path strings directly.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Media file storage rooted at the gateway data directory
#[derive(Debug)]
pub struct MediaStore {
    frames_dir: PathBuf,
    scratch_dir: PathBuf,
    seq: AtomicU64,
}

impl MediaStore {
    /// Create a store, ensuring its directories exist
    ///
    /// # Errors
    ///
    /// Returns error if a directory cannot be created.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let frames_dir = data_dir.join("frames");
        let scratch_dir = data_dir.join("scratch");
        for dir in [&frames_dir, &scratch_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                Error::Storage(format!("cannot create {}: {e}", dir.display()))
            })?;
        }

        Ok(Self {
            frames_dir,
            scratch_dir,
            seq: AtomicU64::new(0),
        })
    }

    /// Write an ingested frame to a uniquely named file
    ///
    /// The name carries the device, the ingestion timestamp, and a process
    /// monotonic counter, so concurrent ingests never overwrite each other
    /// even when timestamps collide at second resolution.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub async fn store_frame(&self, device_id: &str, bytes: &[u8]) -> Result<StoredFrame> {
        let timestamp = chrono::Utc::now().timestamp();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let path = self.frames_dir.join(format!(
            "{}_{timestamp}_{seq}.jpg",
            sanitize_device_id(device_id)
        ));

        tokio::fs::write(&path, bytes).await.map_err(|e| {
            Error::Storage(format!("cannot write frame {}: {e}", path.display()))
        })?;

        tracing::debug!(device = %device_id, path = %path.display(), "frame stored");
        Ok(StoredFrame { path, timestamp })
    }

    /// Spool inbound query audio to a per-request unique scratch file
    ///
    /// The returned handle removes the file when dropped, whether the query
    /// pipeline completes or fails.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created or written.
    pub fn spool_audio(&self, bytes: &[u8]) -> Result<ScratchAudio> {
        let mut file = tempfile::Builder::new()
            .prefix("query-")
            .suffix(".wav")
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| Error::Storage(format!("cannot create audio spool: {e}")))?;

        file.write_all(bytes)
            .map_err(|e| Error::Storage(format!("cannot write audio spool: {e}")))?;

        Ok(ScratchAudio { file })
    }
}

/// Typed locator for one stored frame file
///
/// Owns the backing file: the file is removed exactly once, when the locator
/// is dropped. Held behind an `Arc` in the frame window so eviction defers
/// deletion until the last in-flight reader is done.
#[derive(Debug)]
pub struct StoredFrame {
    path: PathBuf,
    timestamp: i64,
}

impl StoredFrame {
    /// Path of the backing image file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ingestion time, seconds since epoch
    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

impl Drop for StoredFrame {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            // A stale file is a degraded state, not a fatal one
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to delete evicted frame");
            }
        }
    }
}

/// Per-request scratch file holding inbound query audio
///
/// Backed by a named temp file; removed on drop.
#[derive(Debug)]
pub struct ScratchAudio {
    file: NamedTempFile,
}

impl ScratchAudio {
    /// Path of the spooled audio file
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Restrict device identifiers to a safe filename alphabet
fn sanitize_device_id(device_id: &str) -> String {
    let sanitized: String = device_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "device".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frame_names_are_unique_within_one_second() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path()).unwrap();

        let a = store.store_frame("cam-1", b"a").await.unwrap();
        let b = store.store_frame("cam-1", b"b").await.unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn dropping_a_frame_removes_its_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path()).unwrap();

        let frame = store.store_frame("cam-1", b"jpeg bytes").await.unwrap();
        let path = frame.path().to_path_buf();
        assert!(path.exists());

        drop(frame);
        assert!(!path.exists());
    }

    #[test]
    fn scratch_audio_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path()).unwrap();

        let scratch = store.spool_audio(b"wav bytes").unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.exists());

        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn device_ids_are_sanitized() {
        assert_eq!(sanitize_device_id("cam/../../etc"), "cam-..-..-etc");
        assert_eq!(sanitize_device_id("10.0.0.7:9090"), "10.0.0.7-9090");
        assert_eq!(sanitize_device_id(""), "device");
    }
}
