//! Ingestion adapter: one sequential worker that decodes feed payloads and appends records.

use chrono::Utc;
use ledger_types::{
    DecodeError, EventRecord, EventSink, FeedSource, IngestError, IngestStats, SubjectEvent,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Accepted/rejected message counters, shared with whoever reports health.
#[derive(Debug, Default)]
pub struct IngestCounters {
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl IngestCounters {
    pub fn snapshot(&self) -> IngestStats {
        IngestStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Bridges a feed to the ledger. Holds only the append half of the ledger.
///
/// Successfully decoded payloads are never deduplicated: a redelivered message
/// becomes a new record with a new id.
pub struct IngestionAdapter {
    sink: Arc<dyn EventSink>,
    counters: Arc<IngestCounters>,
}

impl IngestionAdapter {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            counters: Arc::new(IngestCounters::default()),
        }
    }

    /// Decode one payload and append it. A decode failure leaves the ledger untouched.
    pub fn ingest(&self, payload: &[u8]) -> Result<Arc<EventRecord>, DecodeError> {
        let msg = match SubjectEvent::decode_payload(payload) {
            Ok(msg) => msg,
            Err(e) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, bytes = payload.len(), "dropping undecodable feed message");
                return Err(e);
            }
        };
        let record = Arc::new(EventRecord::from_message(msg, Utc::now()));
        self.sink.append(Arc::clone(&record));
        self.counters.accepted.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            subject_id = %record.subject_id(),
            subject_name = %record.subject_name(),
            event_type = %record.event_type(),
            "recorded subject event"
        );
        Ok(record)
    }

    pub fn counters(&self) -> Arc<IngestCounters> {
        Arc::clone(&self.counters)
    }

    pub fn stats(&self) -> IngestStats {
        self.counters.snapshot()
    }

    /// Spawn the consume loop on the current tokio runtime.
    ///
    /// The loop ends when the feed closes, when [`IngestHandle::shutdown`] is called,
    /// or when the handle is dropped.
    pub fn spawn<F>(self, feed: F) -> IngestHandle
    where
        F: FeedSource + 'static,
    {
        let (stop_tx, stop_rx) = oneshot::channel();
        let counters = self.counters();
        let task = tokio::spawn(run(self, feed, stop_rx));
        IngestHandle {
            stop: Some(stop_tx),
            task,
            counters,
        }
    }
}

async fn run<F: FeedSource>(adapter: IngestionAdapter, mut feed: F, mut stop: oneshot::Receiver<()>) {
    tracing::info!("ingestion worker started");
    loop {
        tokio::select! {
            biased;
            _ = &mut stop => {
                tracing::info!("ingestion worker stopping on request");
                break;
            }
            next = feed.next_message() => match next {
                // failures are counted and logged inside ingest
                Some(payload) => {
                    let _ = adapter.ingest(&payload);
                }
                None => {
                    tracing::info!("feed closed; ingestion worker stopping");
                    break;
                }
            },
        }
    }
    let stats = adapter.stats();
    tracing::info!(accepted = stats.accepted, rejected = stats.rejected, "ingestion worker stopped");
}

/// Handle to a running ingestion worker.
pub struct IngestHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    counters: Arc<IngestCounters>,
}

impl IngestHandle {
    pub fn counters(&self) -> Arc<IngestCounters> {
        Arc::clone(&self.counters)
    }

    pub fn stats(&self) -> IngestStats {
        self.counters.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop consuming and wait for the worker to exit. A message already being
    /// decoded is completed; nothing further is read from the feed.
    pub async fn shutdown(mut self) -> Result<IngestStats, IngestError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        (&mut self.task)
            .await
            .map_err(|e| IngestError::Worker(e.to_string()))?;
        Ok(self.counters.snapshot())
    }
}
