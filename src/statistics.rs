//! Run statistics: who infected whom, test error counts, tracing volume and a compartment count
//! per simulated day. The kernel only writes here; the report layer reads it after the run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::case::{CaseId, ExposedBy};
use crate::event::Time;
use crate::population::CmptRecord;

/// One edge of the infection tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfectionRecord {
    pub time: Time,
    pub infector: ExposedBy,
    pub infectee: CaseId,
}

#[derive(Debug, Clone, Default)]
pub struct StatisticsRecorder {
    infections: Vec<InfectionRecord>,
    false_positives: usize,
    false_negatives: usize,
    traced_alerts: usize,
    daily: BTreeMap<i64, CmptRecord>,
}

impl StatisticsRecorder {
    #[must_use]
    pub fn new() -> StatisticsRecorder {
        StatisticsRecorder::default()
    }

    pub fn record_infection(&mut self, time: Time, infector: ExposedBy, infectee: CaseId) {
        self.infections.push(InfectionRecord {
            time,
            infector,
            infectee,
        });
    }

    pub fn record_false_positive(&mut self) {
        self.false_positives += 1;
    }

    pub fn record_false_negative(&mut self) {
        self.false_negatives += 1;
    }

    pub fn record_traced_alerts(&mut self, count: usize) {
        self.traced_alerts += count;
    }

    /// Stores the counts for `day`, replacing counts from an earlier step of the same day.
    pub fn record_day(&mut self, day: i64, counts: CmptRecord) {
        self.daily.insert(day, counts);
    }

    #[must_use]
    pub fn infections(&self) -> &[InfectionRecord] {
        &self.infections
    }

    #[must_use]
    pub fn false_positives(&self) -> usize {
        self.false_positives
    }

    #[must_use]
    pub fn false_negatives(&self) -> usize {
        self.false_negatives
    }

    #[must_use]
    pub fn traced_alerts(&self) -> usize {
        self.traced_alerts
    }

    /// `(day, counts)` in day order.
    pub fn daily_records(&self) -> impl Iterator<Item = (i64, &CmptRecord)> {
        self.daily.iter().map(|(day, record)| (*day, record))
    }

    #[must_use]
    pub fn day(&self, day: i64) -> Option<&CmptRecord> {
        self.daily.get(&day)
    }
}
