//! One-shot celebration triggering
//!
//! Fires at most once per (date, level) pair within a session.
//! History present when the session starts is seeded into the de-dup
//! set without firing, so only transitions observed live celebrate.

use std::collections::HashSet;

use chrono::NaiveDate;

use wavelength_common::model::DailyRecord;
use wavelength_common::sync::{classify_record, CelebrationContent, SyncLevel};

#[derive(Debug, Default)]
pub struct CelebrationTrigger {
    seen: HashSet<(NaiveDate, SyncLevel)>,
}

impl CelebrationTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record existing qualifying levels without firing
    pub fn seed(&mut self, records: &[DailyRecord]) {
        for record in records {
            let level = classify_record(record);
            if level != SyncLevel::None {
                self.seen.insert((record.date, level));
            }
        }
    }

    /// Evaluate a freshly committed or snapshot-delivered record.
    ///
    /// Returns the celebration payload the first time a (date, level)
    /// pair above `None` appears; redundant deliveries of the same
    /// pair stay silent. A day climbing to a higher level fires again
    /// for the new level.
    pub fn evaluate(&mut self, record: &DailyRecord) -> Option<(SyncLevel, CelebrationContent)> {
        let level = classify_record(record);
        let content = level.celebration()?;

        if self.seen.insert((record.date, level)) {
            Some((level, content))
        } else {
            None
        }
    }
}
