//! Event records and query result DTOs.

use crate::SubjectEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One ingested occurrence about a subject (a person record).
///
/// Fields are private: once built, a record is only ever read. The ledger hands out
/// `Arc<EventRecord>` so readers share the same immutable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    id: String,
    subject_id: String,
    subject_name: String,
    subject_email: String,
    event_type: String,
    timestamp: DateTime<Utc>,
}

impl EventRecord {
    /// Build a record with a fresh random id. `timestamp` is the ingestion instant.
    pub fn new(
        subject_id: impl Into<String>,
        subject_name: impl Into<String>,
        subject_email: impl Into<String>,
        event_type: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.into(),
            subject_name: subject_name.into(),
            subject_email: subject_email.into(),
            event_type: event_type.into(),
            timestamp,
        }
    }

    /// Build a record from a decoded feed message. Nothing but the four payload
    /// fields is taken from the message.
    pub fn from_message(msg: SubjectEvent, timestamp: DateTime<Utc>) -> Self {
        Self::new(msg.subject_id, msg.name, msg.email, msg.event_type, timestamp)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    pub fn subject_email(&self) -> &str {
        &self.subject_email
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Result of a summary query over one ledger snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_events: usize,
    /// Only types present in the snapshot; values sum to `total_events`.
    pub events_by_type: BTreeMap<String, usize>,
    pub unique_subjects: usize,
    pub events_in_last_hour: usize,
    pub events_in_last_24_hours: usize,
}

/// Capacity-driven lifecycle of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerPhase {
    /// Fewer than `capacity` records held; every append grows the ledger.
    Filling,
    /// Capacity reached; every append evicts exactly one record.
    Steady,
}

/// Counters reported by the ingestion adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    pub accepted: u64,
    pub rejected: u64,
}
