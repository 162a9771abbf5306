//! Event ledger: the bounded, concurrently shared store of recent event records.

mod memory;

pub use ledger_types::{EventRecord, EventSink, EventView, LedgerError, LedgerPhase};
pub use memory::EventLedger;
