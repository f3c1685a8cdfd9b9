use std::collections::VecDeque;

use chatlink_core::{DiagnosticRecord, LedgerSummary};

/// Bounded in-memory log of recent probe and send attempts, oldest first.
///
/// Purely observational: nothing in the client reads it to make decisions.
#[derive(Debug, Clone)]
pub struct DiagnosticLedger {
    capacity: usize,
    records: VecDeque<DiagnosticRecord>,
}

impl DiagnosticLedger {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a record, evicting the oldest once full.
    pub fn append(&mut self, record: DiagnosticRecord) {
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Snapshot of the held records in chronological order.
    pub fn recent(&self) -> Vec<DiagnosticRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&DiagnosticRecord> {
        self.records.back()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary::from_records(self.records.iter())
    }
}

#[cfg(test)]
mod tests {
    use chatlink_core::AttemptPhase;

    use super::*;

    fn record(i: u64) -> DiagnosticRecord {
        DiagnosticRecord::success(&format!("f{i}"), AttemptPhase::Send, 200, i)
    }

    #[test]
    fn evicts_oldest_first() {
        let capacity = 50;
        let mut ledger = DiagnosticLedger::new(capacity);
        for i in 0..(capacity as u64 + 5) {
            ledger.append(record(i));
        }

        assert_eq!(ledger.len(), capacity);
        let latencies: Vec<u64> = ledger.recent().iter().map(|r| r.latency_ms).collect();
        let expected: Vec<u64> = (5..capacity as u64 + 5).collect();
        assert_eq!(latencies, expected);
        assert_eq!(ledger.last().map(|r| r.format.as_str()), Some("f54"));
    }

    #[test]
    fn clear_empties_the_ledger() {
        let mut ledger = DiagnosticLedger::new(3);
        ledger.append(record(1));
        ledger.append(record(2));
        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(ledger.summary().total, 0);
    }

    #[test]
    fn capacity_is_at_least_one() {
        let mut ledger = DiagnosticLedger::new(0);
        assert_eq!(ledger.capacity(), 1);
        ledger.append(record(1));
        ledger.append(record(2));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.recent()[0].latency_ms, 2);
    }

    #[test]
    fn summary_reflects_held_records_only() {
        let mut ledger = DiagnosticLedger::new(2);
        ledger.append(DiagnosticRecord::failure(
            "minimal",
            AttemptPhase::Send,
            Some(500),
            10,
            "boom",
        ));
        ledger.append(record(20));
        ledger.append(record(40));

        let summary = ledger.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.failures, 0);
        assert_eq!(summary.avg_success_latency_ms, Some(30));
    }
}
