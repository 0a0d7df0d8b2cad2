//! Sync level classification and celebration payloads
//!
//! Derives how closely the two partners' daily ratings align and maps
//! each qualifying tier to its celebratory title, message, and media
//! reference.

use serde::{Deserialize, Serialize};

use crate::model::DailyRecord;

/// How closely the two partners' ratings align for one day
///
/// Derived from a record's two ratings, never stored. Variants are
/// ordered so that comparisons follow tier strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncLevel {
    /// A rating is absent or the pair falls below every threshold
    None,
    /// Both rated +3 or higher
    Sync,
    /// Both rated +4 or higher
    SuperSync,
    /// Both rated exactly +5
    PerfectSync,
}

/// Classify a pair of ratings into a sync level.
///
/// Pure and total. An absent rating on either side yields
/// `SyncLevel::None` regardless of the other value. Higher tiers are
/// checked first: their thresholds subsume the lower ones.
pub fn classify(person1: Option<i32>, person2: Option<i32>) -> SyncLevel {
    let (Some(a), Some(b)) = (person1, person2) else {
        return SyncLevel::None;
    };

    if a == 5 && b == 5 {
        SyncLevel::PerfectSync
    } else if a >= 4 && b >= 4 {
        SyncLevel::SuperSync
    } else if a >= 3 && b >= 3 {
        SyncLevel::Sync
    } else {
        SyncLevel::None
    }
}

/// Classify one day's record
pub fn classify_record(record: &DailyRecord) -> SyncLevel {
    classify(record.person1_rating, record.person2_rating)
}

const SYNC_GIF_URL: &str = "https://media4.giphy.com/media/v1.Y2lkPTc5MGI3NjExNjJuZDB2YjJ0dG84NTZkYjZpZHQxeGtqZ3Z3eHFzaXRrMm9iN2I4byZlcD12MV9pbnRlcm5hbF9naWZfYnlfaWQmY3Q9Zw/5GdhgaBpA3oCA/giphy.gif";

const SUPER_SYNC_GIF_URL: &str = "https://media2.giphy.com/media/v1.Y2lkPTc5MGI3NjExZGs3ZTYxOHVhdDlxYnhoaHZ2ZXp2bW81cW1yZHV6Z2t6cnNpcnRzMSZlcD12MV9pbnRlcm5hbF9naWZfYnlfaWQmY3Q9Zw/j3VDxS7O21XCMbWka0/giphy.gif";

const PERFECT_SYNC_GIF_URL: &str = "https://media4.giphy.com/media/v1.Y2lkPTc5MGI3NjExeWZ2ZTN5MTdhM29uc20xdDJvcDc5cWYydTA5MGd2M3JoZmgyMjNpaCZlcD12MV9pbnRlcm5hbF9naWZfYnlfaWQmY3Q9Zw/rjkJD1v80CjYs/giphy.gif";

/// Celebratory payload for one qualifying sync level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CelebrationContent {
    pub title: &'static str,
    pub message: &'static str,
    pub gif_url: &'static str,
}

/// A record annotated with its derived sync level
///
/// Flattened on the wire so clients see one flat object per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordWithSync {
    #[serde(flatten)]
    pub record: DailyRecord,
    pub sync_level: SyncLevel,
}

impl From<DailyRecord> for RecordWithSync {
    fn from(record: DailyRecord) -> Self {
        let sync_level = classify_record(&record);
        Self { record, sync_level }
    }
}

impl SyncLevel {
    /// Wire/display name for the level
    pub fn label(self) -> &'static str {
        match self {
            SyncLevel::None => "none",
            SyncLevel::Sync => "sync",
            SyncLevel::SuperSync => "super-sync",
            SyncLevel::PerfectSync => "perfect-sync",
        }
    }

    /// Celebration payload for the level; `None` never celebrates
    pub fn celebration(self) -> Option<CelebrationContent> {
        match self {
            SyncLevel::None => None,
            SyncLevel::Sync => Some(CelebrationContent {
                title: "Soulmate Sync!",
                message: "You're both on the same amazing wavelength today!",
                gif_url: SYNC_GIF_URL,
            }),
            SyncLevel::SuperSync => Some(CelebrationContent {
                title: "Perfect Harmony!",
                message: "You're both on an incredible high today! Amazing!",
                gif_url: SUPER_SYNC_GIF_URL,
            }),
            SyncLevel::PerfectSync => Some(CelebrationContent {
                title: "A Perfect Day!",
                message: "An absolutely perfect day for both of you. This is true bliss!",
                gif_url: PERFECT_SYNC_GIF_URL,
            }),
        }
    }
}
