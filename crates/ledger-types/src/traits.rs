//! Traits at the seams between the feed, the ledger and its readers.

use crate::{EventRecord, LedgerPhase};
use async_trait::async_trait;
use std::sync::Arc;

/// Write half of the ledger: all the ingestion side may do is append.
pub trait EventSink: Send + Sync {
    /// Insert `record` as the newest entry, evicting the oldest when over capacity.
    fn append(&self, record: Arc<EventRecord>);
}

/// Read half of the ledger.
pub trait EventView: Send + Sync {
    /// Point-in-time copy of every held record, newest first.
    fn snapshot(&self) -> Vec<Arc<EventRecord>>;

    fn size(&self) -> usize;

    fn capacity(&self) -> usize;

    fn phase(&self) -> LedgerPhase {
        if self.size() >= self.capacity() {
            LedgerPhase::Steady
        } else {
            LedgerPhase::Filling
        }
    }
}

/// Source of opaque feed payloads (e.g. a message broker subscription).
#[async_trait]
pub trait FeedSource: Send {
    /// Wait for the next payload. `None` means the feed is closed for good.
    async fn next_message(&mut self) -> Option<Vec<u8>>;
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger capacity must be at least 1")]
    ZeroCapacity,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("feed closed")]
    FeedClosed,
    #[error("ingestion worker failed: {0}")]
    Worker(String),
}
