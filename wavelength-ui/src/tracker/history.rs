//! In-memory aggregation of the daily rating history
//!
//! Holds the ordered list the rest of the service reads from. Store
//! snapshots replace the list wholesale; optimistic updates patch one
//! participant's fields ahead of the store round-trip. The list keeps
//! at most one record per date, ascending by date.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use wavelength_common::model::{DailyRecord, RatingPatch};
use wavelength_common::sync::{classify_record, SyncLevel};

#[derive(Debug, Default, Clone)]
pub struct RatingHistory {
    records: Vec<DailyRecord>,
}

impl RatingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with the store's authoritative set.
    ///
    /// The store delivers records ordered, but the sort/uniqueness
    /// invariant is re-established here rather than trusted: later
    /// duplicates win, then everything is date-ordered.
    pub fn ingest_snapshot(&mut self, records: Vec<DailyRecord>) {
        let mut by_date: BTreeMap<NaiveDate, DailyRecord> = BTreeMap::new();
        for record in records {
            by_date.insert(record.date, record);
        }
        self.records = by_date.into_values().collect();
    }

    /// Update-or-insert one participant's fields for `date` ahead of
    /// the store write, leaving the other participant untouched.
    ///
    /// Returns the resulting record so callers can evaluate it for
    /// celebrations. The next snapshot supersedes this unconditionally.
    pub fn apply_optimistic(&mut self, date: NaiveDate, patch: &RatingPatch) -> DailyRecord {
        match self.records.binary_search_by_key(&date, |r| r.date) {
            Ok(index) => {
                self.records[index].apply(patch);
                self.records[index].clone()
            }
            Err(index) => {
                let mut record = DailyRecord::empty(date);
                record.apply(patch);
                self.records.insert(index, record.clone());
                record
            }
        }
    }

    /// All records, ascending by date
    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    /// The record for one date, if any
    pub fn get(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|index| &self.records[index])
    }

    /// Most recent day whose ratings reached a qualifying sync level.
    ///
    /// Scans from latest to earliest and returns the first record
    /// classifying above `SyncLevel::None`.
    pub fn latest_sync_event(&self) -> Option<(NaiveDate, SyncLevel)> {
        self.records.iter().rev().find_map(|record| {
            let level = classify_record(record);
            (level != SyncLevel::None).then_some((record.date, level))
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
