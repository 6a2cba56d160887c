//! Device sessions and the process-wide session registry
//!
//! A session is the per-device state kept for the lifetime of the server:
//! its rolling frame window. Sessions are created lazily on first contact
//! and never removed.

mod frames;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::RwLock;

pub use frames::{FrameRecord, FrameStore};

/// State for one physical device
#[derive(Debug)]
pub struct DeviceSession {
    device_id: String,
    frames: Mutex<FrameStore>,
}

impl DeviceSession {
    fn new(device_id: &str, frame_capacity: usize) -> Self {
        Self {
            device_id: device_id.to_string(),
            frames: Mutex::new(FrameStore::new(frame_capacity)),
        }
    }

    /// Stable device identifier this session is keyed by
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Append a frame to the device's window
    pub fn append_frame(&self, record: FrameRecord) {
        self.lock_frames().append(record);
    }

    /// Snapshot of the most recent frame, if any
    ///
    /// The lock is released before this returns; callers use the snapshot
    /// across slow collaborator calls without blocking ingest.
    #[must_use]
    pub fn latest_frame(&self) -> Option<FrameRecord> {
        self.lock_frames().latest()
    }

    /// Snapshot of the whole window, oldest first
    #[must_use]
    pub fn frames(&self) -> Vec<FrameRecord> {
        self.lock_frames().records()
    }

    /// Number of retained frames
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.lock_frames().len()
    }

    fn lock_frames(&self) -> std::sync::MutexGuard<'_, FrameStore> {
        // The window is only touched in short non-async critical sections,
        // so a poisoned lock just means a panic mid-append; the window
        // itself is still structurally sound (append is two queue ops).
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-wide map of device id to session
///
/// The only globally shared mutable structure in the gateway. Reads are the
/// hot path; the write lock is taken only to insert an unseen device.
#[derive(Debug)]
pub struct SessionRegistry {
    frame_capacity: usize,
    sessions: RwLock<HashMap<String, Arc<DeviceSession>>>,
}

impl SessionRegistry {
    /// Create an empty registry whose sessions use the given frame capacity
    #[must_use]
    pub fn new(frame_capacity: usize) -> Self {
        Self {
            frame_capacity,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Return the session for `device_id`, creating it on first contact
    ///
    /// Concurrent first contact for the same id resolves to a single
    /// session: the insertion is re-checked under the write lock, so the
    /// losing caller receives the winner's session.
    pub async fn get_or_create(&self, device_id: &str) -> Arc<DeviceSession> {
        if let Some(session) = self.sessions.read().await.get(device_id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(device_id.to_string())
            .or_insert_with(|| {
                tracing::info!(device = %device_id, "new device session");
                Arc::new(DeviceSession::new(device_id, self.frame_capacity))
            });
        Arc::clone(session)
    }

    /// Existing session for `device_id`, if the device has been seen
    pub async fn get(&self, device_id: &str) -> Option<Arc<DeviceSession>> {
        self.sessions.read().await.get(device_id).map(Arc::clone)
    }

    /// Number of known device sessions
    pub async fn device_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn concurrent_first_contact_yields_one_session() {
        let registry = Arc::new(SessionRegistry::new(10));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.get_or_create("cam-1").await
            }));
        }

        let mut sessions = Vec::new();
        for handle in handles {
            sessions.push(handle.await.unwrap());
        }

        for session in &sessions[1..] {
            assert!(Arc::ptr_eq(&sessions[0], session));
        }
        assert_eq!(registry.device_count().await, 1);
    }

    #[tokio::test]
    async fn distinct_devices_get_independent_sessions() {
        let registry = SessionRegistry::new(10);

        let a = registry.get_or_create("cam-a").await;
        let b = registry.get_or_create("cam-b").await;

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.device_id(), "cam-a");
        assert_eq!(b.device_id(), "cam-b");
        assert_eq!(registry.device_count().await, 2);
    }

    #[tokio::test]
    async fn get_does_not_create() {
        let registry = SessionRegistry::new(10);
        assert!(registry.get("cam-x").await.is_none());

        registry.get_or_create("cam-x").await;
        assert!(registry.get("cam-x").await.is_some());
    }
}
