//! Per-device rolling frame window

use std::collections::VecDeque;
use std::sync::Arc;

use crate::storage::StoredFrame;

/// One ingested frame: arrival time plus its storage locator
#[derive(Debug, Clone)]
pub struct FrameRecord {
    /// Ingestion time, seconds since epoch
    pub timestamp: i64,

    /// Shared locator for the backing image file
    pub frame: Arc<StoredFrame>,
}

impl FrameRecord {
    /// Wrap a stored frame, taking its ingestion timestamp
    #[must_use]
    pub fn new(frame: StoredFrame) -> Self {
        Self {
            timestamp: frame.timestamp(),
            frame: Arc::new(frame),
        }
    }
}

/// Bounded FIFO window of recent frames, oldest first
///
/// Appends beyond capacity evict the head record. Eviction drops the window's
/// reference to the backing file; the file itself is deleted when the last
/// clone of the record goes away, so a snapshot handed out by [`latest`]
/// stays readable while an in-flight query still uses it.
///
/// [`latest`]: FrameStore::latest
#[derive(Debug)]
pub struct FrameStore {
    frames: VecDeque<FrameRecord>,
    capacity: usize,
}

impl FrameStore {
    /// Create an empty window holding at most `capacity` frames
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record at the tail, evicting the oldest when over capacity
    ///
    /// Arrival order is kept as-is; timestamps are not reordered.
    pub fn append(&mut self, record: FrameRecord) {
        self.frames.push_back(record);
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
    }

    /// Most recently appended record, if any
    ///
    /// The clone is a stable snapshot: a concurrent evicting append cannot
    /// invalidate the returned locator.
    #[must_use]
    pub fn latest(&self) -> Option<FrameRecord> {
        self.frames.back().cloned()
    }

    /// Records currently in the window, oldest first
    #[must_use]
    pub fn records(&self) -> Vec<FrameRecord> {
        self.frames.iter().cloned().collect()
    }

    /// Number of retained frames
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the window is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
