//! In-memory ledger: a lock-guarded deque of shared record handles.

use ledger_types::{EventRecord, EventSink, EventView, LedgerError};
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

struct LedgerState {
    /// Newest at the front.
    records: VecDeque<Arc<EventRecord>>,
    evicted: u64,
}

/// Bounded store of the most recent `capacity` event records.
///
/// Insert and trim happen under one write lock, so no reader ever sees more than
/// `capacity` records. Snapshots clone `Arc` handles only; the critical section is
/// at most `capacity` pointer copies.
pub struct EventLedger {
    capacity: usize,
    state: RwLock<LedgerState>,
}

impl EventLedger {
    pub fn new(capacity: usize) -> Result<Self, LedgerError> {
        if capacity == 0 {
            return Err(LedgerError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            state: RwLock::new(LedgerState {
                records: VecDeque::with_capacity(capacity),
                evicted: 0,
            }),
        })
    }

    /// Number of records evicted by capacity pressure since construction.
    pub fn evicted_total(&self) -> u64 {
        self.read().evicted
    }

    // Poisoning is ignored: the trim always completes before the write guard
    // drops, so the deque is never left over capacity.
    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for EventLedger {
    fn append(&self, record: Arc<EventRecord>) {
        let mut guard = self.write();
        let was_filling = guard.records.len() < self.capacity;
        guard.records.push_front(record);
        while guard.records.len() > self.capacity {
            guard.records.pop_back();
            guard.evicted += 1;
        }
        if was_filling && guard.records.len() == self.capacity {
            tracing::debug!(capacity = self.capacity, "ledger full; evicting oldest from now on");
        }
    }
}

impl EventView for EventLedger {
    fn snapshot(&self) -> Vec<Arc<EventRecord>> {
        self.read().records.iter().cloned().collect()
    }

    fn size(&self) -> usize {
        self.read().records.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
