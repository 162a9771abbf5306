//! Query layer over the read half of the ledger. Every query takes exactly one
//! snapshot and scans it once; nothing is cached between calls.

use chrono::{DateTime, Utc};
use ledger_types::{AnalyticsSummary, EventRecord, EventView, LedgerPhase, SummaryWindows};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

pub struct AggregationEngine {
    view: Arc<dyn EventView>,
    windows: SummaryWindows,
}

impl AggregationEngine {
    pub fn new(view: Arc<dyn EventView>, windows: SummaryWindows) -> Self {
        Self { view, windows }
    }

    pub fn windows(&self) -> SummaryWindows {
        self.windows
    }

    /// Summary evaluated at the current wall-clock time.
    pub fn summary(&self) -> AnalyticsSummary {
        self.summary_at(Utc::now())
    }

    /// Summary evaluated at `now`. Window counts include records strictly after
    /// `now - window`; a record exactly on the boundary is excluded. A window
    /// reaching past the earliest representable instant counts every record.
    pub fn summary_at(&self, now: DateTime<Utc>) -> AnalyticsSummary {
        let snapshot = self.view.snapshot();
        let short_cutoff = now.checked_sub_signed(self.windows.short);
        let long_cutoff = now.checked_sub_signed(self.windows.long);

        let mut events_by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut subjects: HashSet<&str> = HashSet::new();
        let mut in_short = 0;
        let mut in_long = 0;
        for record in &snapshot {
            *events_by_type
                .entry(record.event_type().to_string())
                .or_default() += 1;
            subjects.insert(record.subject_id());
            let ts = record.timestamp();
            if within(ts, short_cutoff) {
                in_short += 1;
            }
            if within(ts, long_cutoff) {
                in_long += 1;
            }
        }
        let summary = AnalyticsSummary {
            total_events: snapshot.len(),
            events_by_type,
            unique_subjects: subjects.len(),
            events_in_last_hour: in_short,
            events_in_last_24_hours: in_long,
        };
        tracing::debug!(
            total = summary.total_events,
            types = summary.events_by_type.len(),
            "summary computed"
        );
        summary
    }

    /// Up to `limit` newest records, newest first. Non-positive limits yield nothing.
    pub fn recent(&self, limit: i64) -> Vec<Arc<EventRecord>> {
        if limit <= 0 {
            return Vec::new();
        }
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut snapshot = self.view.snapshot();
        snapshot.truncate(limit);
        snapshot
    }

    /// Records whose event type equals `event_type` exactly (case-sensitive).
    pub fn by_type(&self, event_type: &str) -> Vec<Arc<EventRecord>> {
        self.filter(|r| r.event_type() == event_type)
    }

    /// Records whose subject id equals `subject_id` exactly.
    pub fn by_subject(&self, subject_id: &str) -> Vec<Arc<EventRecord>> {
        self.filter(|r| r.subject_id() == subject_id)
    }

    pub fn ledger_size(&self) -> usize {
        self.view.size()
    }

    pub fn ledger_capacity(&self) -> usize {
        self.view.capacity()
    }

    pub fn ledger_phase(&self) -> LedgerPhase {
        self.view.phase()
    }

    fn filter<P>(&self, predicate: P) -> Vec<Arc<EventRecord>>
    where
        P: Fn(&EventRecord) -> bool,
    {
        self.view
            .snapshot()
            .into_iter()
            .filter(|r| predicate(r.as_ref()))
            .collect()
    }
}

fn within(ts: DateTime<Utc>, cutoff: Option<DateTime<Utc>>) -> bool {
    cutoff.map_or(true, |c| ts > c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ledger_store::EventLedger;
    use ledger_types::{EventSink, LedgerConfig};
    use proptest::prelude::*;

    fn setup(capacity: usize) -> (Arc<EventLedger>, AggregationEngine) {
        let ledger = Arc::new(EventLedger::new(capacity).unwrap());
        let engine = AggregationEngine::new(ledger.clone(), SummaryWindows::default());
        (ledger, engine)
    }

    fn push(ledger: &EventLedger, subject: &str, kind: &str, at: DateTime<Utc>) -> Arc<EventRecord> {
        let r = Arc::new(EventRecord::new(subject, "Name", "n@example.com", kind, at));
        ledger.append(Arc::clone(&r));
        r
    }

    #[test]
    fn empty_ledger_yields_zeroes() {
        let (_, engine) = setup(10);
        assert_eq!(engine.summary(), AnalyticsSummary::default());
        assert!(engine.recent(50).is_empty());
        assert!(engine.by_type("PATIENT_CREATED").is_empty());
        assert!(engine.by_subject("p1").is_empty());
    }

    #[test]
    fn summary_counts_types_and_subjects() {
        let (ledger, engine) = setup(10);
        let now = Utc::now();
        push(&ledger, "p1", "PATIENT_CREATED", now);
        push(&ledger, "p1", "PATIENT_UPDATED", now);
        push(&ledger, "p2", "PATIENT_CREATED", now);

        let s = engine.summary_at(now);
        assert_eq!(s.total_events, 3);
        assert_eq!(s.unique_subjects, 2);
        assert_eq!(s.events_by_type.get("PATIENT_CREATED"), Some(&2));
        assert_eq!(s.events_by_type.get("PATIENT_UPDATED"), Some(&1));
        assert!(!s.events_by_type.contains_key("PATIENT_DELETED"));
        assert_eq!(s.events_by_type.values().sum::<usize>(), s.total_events);
    }

    #[test]
    fn windows_use_strict_after() {
        let (ledger, engine) = setup(10);
        let t = Utc::now();
        push(&ledger, "p1", "A", t - Duration::minutes(30));
        push(&ledger, "p2", "A", t - Duration::hours(2));
        push(&ledger, "p3", "A", t - Duration::hours(1));
        push(&ledger, "p4", "A", t - Duration::hours(24));
        push(&ledger, "p5", "A", t - Duration::hours(30));

        let s = engine.summary_at(t);
        assert_eq!(s.events_in_last_hour, 1);
        assert_eq!(s.events_in_last_24_hours, 3);
        assert_eq!(s.total_events, 5);
    }

    #[test]
    fn windows_are_configurable() {
        let ledger = Arc::new(EventLedger::new(10).unwrap());
        let windows = SummaryWindows {
            short: Duration::minutes(5),
            long: Duration::minutes(45),
        };
        let engine = AggregationEngine::new(ledger.clone(), windows);
        let t = Utc::now();
        push(&ledger, "p1", "A", t - Duration::minutes(1));
        push(&ledger, "p1", "A", t - Duration::minutes(30));
        push(&ledger, "p1", "A", t - Duration::minutes(50));

        let s = engine.summary_at(t);
        assert_eq!(s.events_in_last_hour, 1);
        assert_eq!(s.events_in_last_24_hours, 2);
        assert_eq!(engine.windows(), windows);
    }

    #[test]
    fn recent_clamps_limit() {
        let (ledger, engine) = setup(10);
        let now = Utc::now();
        let a = push(&ledger, "p1", "A", now);
        let b = push(&ledger, "p2", "A", now);
        let c = push(&ledger, "p3", "A", now);

        assert!(engine.recent(0).is_empty());
        assert!(engine.recent(-7).is_empty());
        assert_eq!(engine.recent(2).len(), 2);
        let all = engine.recent(i64::MAX);
        let ids: Vec<&str> = all.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![c.id(), b.id(), a.id()]);
        assert_eq!(engine.recent(2)[0].id(), c.id());
        assert_eq!(engine.recent(2)[1].id(), b.id());
    }

    #[test]
    fn by_type_is_exact_and_ordered() {
        let (ledger, engine) = setup(10);
        let now = Utc::now();
        let first = push(&ledger, "p1", "PATIENT_CREATED", now);
        push(&ledger, "p2", "patient_created", now);
        push(&ledger, "p3", "PATIENT_UPDATED", now);
        let last = push(&ledger, "p4", "PATIENT_CREATED", now);

        let hits = engine.by_type("PATIENT_CREATED");
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|r| r.event_type() == "PATIENT_CREATED"));
        assert_eq!(hits[0].id(), last.id());
        assert_eq!(hits[1].id(), first.id());
        assert!(engine.by_type("PATIENT_DELETED").is_empty());
    }

    #[test]
    fn by_subject_filters_on_subject_id() {
        let (ledger, engine) = setup(10);
        let now = Utc::now();
        push(&ledger, "p1", "A", now);
        push(&ledger, "p2", "B", now);
        push(&ledger, "p1", "C", now);

        let hits = engine.by_subject("p1");
        let kinds: Vec<&str> = hits.iter().map(|r| r.event_type()).collect();
        assert_eq!(kinds, vec!["C", "A"]);
        assert!(engine.by_subject("P1").is_empty());
    }

    #[test]
    fn queries_see_only_retained_records() {
        let (ledger, engine) = setup(3);
        let now = Utc::now();
        for (subject, kind) in [("p1", "A"), ("p1", "B"), ("p2", "A"), ("p3", "C")] {
            push(&ledger, subject, kind, now);
        }
        let s = engine.summary_at(now);
        assert_eq!(s.total_events, 3);
        assert_eq!(s.events_by_type.get("A"), Some(&1));
        assert_eq!(s.unique_subjects, 3);
        assert_eq!(engine.ledger_phase(), LedgerPhase::Steady);
        assert_eq!(engine.ledger_size(), 3);
        assert_eq!(engine.ledger_capacity(), 3);
    }

    #[test]
    fn oversized_window_counts_everything() {
        let cfg = LedgerConfig::from_lookup(|key| {
            (key == "ANALYTICS_LONG_WINDOW_SECS").then(|| "10000000000000".to_string())
        })
        .unwrap();
        let ledger = Arc::new(EventLedger::new(10).unwrap());
        let engine = AggregationEngine::new(ledger.clone(), cfg.windows);
        let t = Utc::now();
        push(&ledger, "p1", "A", t - Duration::minutes(10));
        push(&ledger, "p2", "A", t - Duration::days(400));

        let s = engine.summary();
        assert_eq!(s.total_events, 2);
        assert_eq!(s.events_in_last_hour, 1);
        assert_eq!(s.events_in_last_24_hours, 2);

        let s = engine.summary_at(DateTime::<Utc>::MIN_UTC);
        assert_eq!(s.events_in_last_24_hours, 2);
    }

    fn events() -> impl Strategy<Value = Vec<(u8, u8)>> {
        prop::collection::vec((0u8..4, 0u8..6), 0..40)
    }

    proptest! {
        #[test]
        fn type_counts_sum_to_total(capacity in 1usize..24, events in events()) {
            let (ledger, engine) = setup(capacity);
            let now = Utc::now();
            for (kind, subject) in &events {
                push(&ledger, &format!("p{subject}"), &format!("T{kind}"), now);
            }
            let s = engine.summary_at(now);
            prop_assert_eq!(s.total_events, events.len().min(capacity));
            prop_assert_eq!(s.events_by_type.values().sum::<usize>(), s.total_events);
            prop_assert!(s.events_by_type.values().all(|&n| n > 0));
            let snapshot = ledger.snapshot();
            let subjects: HashSet<&str> = snapshot.iter().map(|r| r.subject_id()).collect();
            prop_assert_eq!(s.unique_subjects, subjects.len());
        }

        #[test]
        fn by_type_is_the_matching_subset(capacity in 1usize..24, events in events(), target in 0u8..5) {
            let (ledger, engine) = setup(capacity);
            let now = Utc::now();
            for (kind, subject) in &events {
                push(&ledger, &format!("p{subject}"), &format!("T{kind}"), now);
            }
            let wanted = format!("T{target}");
            let expected: Vec<String> = ledger
                .snapshot()
                .iter()
                .filter(|r| r.event_type() == wanted)
                .map(|r| r.id().to_string())
                .collect();
            let hits = engine.by_type(&wanted);
            prop_assert!(hits.iter().all(|r| r.event_type() == wanted));
            let got: Vec<String> = hits.iter().map(|r| r.id().to_string()).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
