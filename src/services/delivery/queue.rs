use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::store::PersistentStore;
use crate::error::StoreError;
use crate::kernel::packet::TelemetryPacket;

/// A packet plus its delivery bookkeeping. The packet itself is never
/// touched once queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub packet: TelemetryPacket,
    pub queued_at: DateTime<Utc>,
    pub retry_count: u32,
}

impl QueueEntry {
    pub fn new(packet: TelemetryPacket, queued_at: DateTime<Utc>) -> Self {
        Self {
            packet,
            queued_at,
            retry_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStats {
    /// Packets delivered (monotonic).
    pub sent: u64,
    /// Packets that exhausted their retry budget (monotonic).
    pub failed: u64,
    /// Live entries: waiting, in flight, or backing off.
    pub queued: usize,
    pub offline: usize,
}

/// Durable backlog of packets that could not be delivered live.
///
/// The cap is applied when persisting: older entries beyond it are dropped
/// from memory as well as from the store.
#[derive(Debug, Default)]
pub struct OfflineQueue {
    entries: Vec<QueueEntry>,
    key: String,
    cap: usize,
}

impl OfflineQueue {
    pub fn new(key: impl Into<String>, cap: usize) -> Self {
        Self {
            entries: Vec::new(),
            key: key.into(),
            cap,
        }
    }

    /// Read once at startup. A corrupt or unreadable store starts empty.
    pub fn load(key: impl Into<String>, cap: usize, store: &dyn PersistentStore) -> Self {
        let mut queue = Self::new(key, cap);
        match store.load(&queue.key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
                Ok(values) => queue.entries = decode_entries(values, &queue.key),
                Err(err) => warn!(error = %err, key = %queue.key, "discarding corrupt offline queue"),
            },
            Ok(None) => {}
            Err(err) => warn!(error = %err, key = %queue.key, "failed to read offline queue"),
        }
        queue
    }

    pub fn push(&mut self, entry: QueueEntry) {
        self.entries.push(entry);
    }

    pub fn take_all(&mut self) -> Vec<QueueEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Write the most recent `cap` entries. Memory is trimmed to match only
    /// once the write succeeds; on failure the in-memory queue stays
    /// authoritative until the next successful persist.
    pub fn persist(&mut self, store: &dyn PersistentStore) -> Result<(), StoreError> {
        let dropped = self.entries.len().saturating_sub(self.cap);
        let payload = serde_json::to_string(&self.entries[dropped..])?;
        store.save(&self.key, &payload)?;
        if dropped > 0 {
            self.entries.drain(..dropped);
            warn!(dropped, cap = self.cap, "offline queue over cap, oldest entries dropped");
        }
        Ok(())
    }
}

/// One undecodable entry is skipped, not the whole queue.
fn decode_entries(values: Vec<serde_json::Value>, key: &str) -> Vec<QueueEntry> {
    let mut entries = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<QueueEntry>(value) {
            Ok(entry) => entries.push(entry),
            Err(err) => warn!(error = %err, key, index, "skipping unreadable offline entry"),
        }
    }
    entries
}
