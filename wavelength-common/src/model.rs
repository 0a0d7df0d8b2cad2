//! Daily rating records and participant identity

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Inclusive rating bounds enforced at every write boundary
pub const RATING_MIN: i32 = -5;
pub const RATING_MAX: i32 = 5;

/// Emoji labels for each rating from -5 through +5, in ascending order
pub const RATING_EMOJI: [&str; 11] = [
    "😠", "😡", "😞", "😟", "😐", "🙂", "😊", "😄", "😍", "🥰", "💖",
];

/// Validate that a rating falls within the supported range
pub fn validate_rating(rating: i32) -> Result<()> {
    if (RATING_MIN..=RATING_MAX).contains(&rating) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Rating {} outside allowed range {}..={}",
            rating, RATING_MIN, RATING_MAX
        )))
    }
}

/// Which of the two partners a rating belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Participant {
    Person1,
    Person2,
}

impl Participant {
    /// Both participants, in declaration order
    pub const ALL: [Participant; 2] = [Participant::Person1, Participant::Person2];

    /// Stable identifier used in settings keys and log fields
    pub fn as_str(self) -> &'static str {
        match self {
            Participant::Person1 => "person1",
            Participant::Person2 => "person2",
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One calendar day of ratings for both partners.
///
/// Keyed by date; either side may be absent (partial days are valid
/// and persist indefinitely). The ISO date format keeps textual sort
/// order identical to chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub person1_rating: Option<i32>,
    pub person2_rating: Option<i32>,
    pub person1_note: Option<String>,
    pub person2_note: Option<String>,
}

impl DailyRecord {
    /// A record for `date` with neither participant's fields set
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            person1_rating: None,
            person2_rating: None,
            person1_note: None,
            person2_note: None,
        }
    }

    /// Apply one participant's fields, leaving the other side untouched
    pub fn apply(&mut self, patch: &RatingPatch) {
        match patch.participant {
            Participant::Person1 => {
                self.person1_rating = Some(patch.rating);
                self.person1_note = patch.note.clone();
            }
            Participant::Person2 => {
                self.person2_rating = Some(patch.rating);
                self.person2_note = patch.note.clone();
            }
        }
    }
}

/// A merge write scoped to one participant's fields for one date.
///
/// Construction validates the rating range; an empty note is stored
/// as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingPatch {
    pub participant: Participant,
    pub rating: i32,
    pub note: Option<String>,
}

impl RatingPatch {
    pub fn new(participant: Participant, rating: i32, note: Option<String>) -> Result<Self> {
        validate_rating(rating)?;
        let note = note.filter(|n| !n.trim().is_empty());
        Ok(Self {
            participant,
            rating,
            note,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_emoji_scale_covers_full_range() {
        assert_eq!(RATING_EMOJI.len(), (RATING_MAX - RATING_MIN + 1) as usize);
        assert_eq!(RATING_EMOJI[0], "😠");
        assert_eq!(RATING_EMOJI[(0 - RATING_MIN) as usize], "🙂");
        assert_eq!(RATING_EMOJI[(RATING_MAX - RATING_MIN) as usize], "💖");
    }

    #[test]
    fn test_patch_rejects_out_of_range_rating() {
        assert!(RatingPatch::new(Participant::Person1, 6, None).is_err());
        assert!(RatingPatch::new(Participant::Person1, -6, None).is_err());
        assert!(RatingPatch::new(Participant::Person1, 5, None).is_ok());
        assert!(RatingPatch::new(Participant::Person1, -5, None).is_ok());
    }

    #[test]
    fn test_patch_drops_blank_note() {
        let patch = RatingPatch::new(Participant::Person2, 3, Some("   ".to_string())).unwrap();
        assert_eq!(patch.note, None);

        let patch = RatingPatch::new(Participant::Person2, 3, Some("good".to_string())).unwrap();
        assert_eq!(patch.note.as_deref(), Some("good"));
    }

    #[test]
    fn test_apply_preserves_other_participant() {
        let mut record = DailyRecord::empty(date("2025-06-01"));
        record.person2_rating = Some(4);
        record.person2_note = Some("calm".to_string());

        let patch = RatingPatch::new(Participant::Person1, -2, Some("rough".to_string())).unwrap();
        record.apply(&patch);

        assert_eq!(record.person1_rating, Some(-2));
        assert_eq!(record.person1_note.as_deref(), Some("rough"));
        assert_eq!(record.person2_rating, Some(4));
        assert_eq!(record.person2_note.as_deref(), Some("calm"));
    }

    #[test]
    fn test_participant_serialization() {
        assert_eq!(
            serde_json::to_string(&Participant::Person1).unwrap(),
            "\"person1\""
        );
        let p: Participant = serde_json::from_str("\"person2\"").unwrap();
        assert_eq!(p, Participant::Person2);
    }
}
