//! Aggregation engine: stateless read-only queries over ledger snapshots.

mod engine;

pub use engine::AggregationEngine;
pub use ledger_types::{AnalyticsSummary, EventRecord, EventView, SummaryWindows};
