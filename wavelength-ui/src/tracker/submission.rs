//! Delayed-commit submission state
//!
//! A saved rating is captured into a per-participant pending slot and
//! waits out a grace countdown before the commit fires. The countdown
//! is a spawned task tracked by its JoinHandle. Cancellation removes
//! the slot and aborts the task; commit and cancel both take the slot
//! first, so whichever side gets there first wins and the other
//! becomes a no-op.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use wavelength_common::RatingPatch;

/// Countdown shape: how many ticks, and how long each tick lasts
///
/// Production runs one-second ticks. Tests shrink the tick to
/// milliseconds to drive the full pending lifecycle quickly.
#[derive(Debug, Clone, Copy)]
pub struct GracePolicy {
    pub ticks: u32,
    pub tick: Duration,
}

impl GracePolicy {
    /// One-second ticks for `grace_seconds` total
    pub fn standard(grace_seconds: u32) -> Self {
        Self {
            ticks: grace_seconds,
            tick: Duration::from_secs(1),
        }
    }
}

impl Default for GracePolicy {
    fn default() -> Self {
        Self::standard(60)
    }
}

/// A captured rating waiting out its grace period
#[derive(Debug)]
pub struct PendingSubmission {
    pub date: NaiveDate,
    pub patch: RatingPatch,
    pub seconds_remaining: u32,
    /// Countdown task driving ticks and the eventual commit request
    pub task: JoinHandle<()>,
}

impl PendingSubmission {
    pub fn state(&self) -> PendingState {
        PendingState {
            date: self.date,
            rating: self.patch.rating,
            seconds_remaining: self.seconds_remaining,
        }
    }
}

/// Serializable view of one pending slot for API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingState {
    pub date: NaiveDate,
    pub rating: i32,
    pub seconds_remaining: u32,
}

/// Outcome of a save request
///
/// A save against an occupied slot is rejected as a no-op rather than
/// queued or overwritten; the existing slot's state comes back so the
/// caller can report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Scheduled(PendingState),
    AlreadyPending(PendingState),
}
