//! In-process feed backed by a bounded tokio mpsc channel.

use async_trait::async_trait;
use ledger_types::{FeedSource, IngestError};
use tokio::sync::mpsc;

/// Create a connected publisher/feed pair. `buffer` is clamped to at least 1.
pub fn channel(buffer: usize) -> (FeedPublisher, ChannelFeed) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (FeedPublisher { tx }, ChannelFeed { rx })
}

/// Sending half; cheap to clone. Publishing waits while the buffer is full.
#[derive(Clone)]
pub struct FeedPublisher {
    tx: mpsc::Sender<Vec<u8>>,
}

impl FeedPublisher {
    pub async fn publish(&self, payload: Vec<u8>) -> Result<(), IngestError> {
        self.tx
            .send(payload)
            .await
            .map_err(|_| IngestError::FeedClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half, consumed by the ingestion adapter.
pub struct ChannelFeed {
    rx: mpsc::Receiver<Vec<u8>>,
}

#[async_trait]
impl FeedSource for ChannelFeed {
    async fn next_message(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}
