//! Ingestion adapter: consumes feed payloads, decodes them and appends records to the ledger.

mod adapter;
mod channel;

pub use adapter::{IngestCounters, IngestHandle, IngestionAdapter};
pub use channel::{channel, ChannelFeed, FeedPublisher};
pub use ledger_types::{DecodeError, FeedSource, IngestError, IngestStats};
