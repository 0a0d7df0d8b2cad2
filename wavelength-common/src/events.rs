//! Event types for the Wavelength event system
//!
//! Provides the shared event definitions and the EventBus used to fan
//! application events out to SSE clients and internal listeners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::Participant;
use crate::sync::{RecordWithSync, SyncLevel};

/// Wavelength event types
///
/// Events are broadcast via EventBus and serialized for SSE
/// transmission. All state changes of interest to a connected page
/// flow through this enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AppEvent {
    /// Aggregated history changed (store snapshot or optimistic update)
    ///
    /// Carries the full record set, each annotated with its derived
    /// sync level, so clients replace rather than merge.
    HistoryUpdated {
        /// Complete date-ordered history
        records: Vec<RecordWithSync>,
        /// When the update was applied
        timestamp: DateTime<Utc>,
    },

    /// A delayed submission was captured and its countdown started
    SubmissionScheduled {
        /// Whose rating is pending
        participant: Participant,
        /// Date the rating will be written for
        date: chrono::NaiveDate,
        /// The captured rating value
        rating: i32,
        /// Full length of the grace countdown
        grace_seconds: u32,
        /// When the countdown started
        timestamp: DateTime<Utc>,
    },

    /// One tick of a running grace countdown elapsed
    SubmissionTick {
        /// Whose countdown ticked
        participant: Participant,
        /// Seconds left before the commit fires
        seconds_remaining: u32,
        /// When the tick occurred
        timestamp: DateTime<Utc>,
    },

    /// A grace period elapsed and the captured rating was committed
    SubmissionCommitted {
        /// Whose rating was written
        participant: Participant,
        /// Date the rating was written for
        date: chrono::NaiveDate,
        /// The committed rating value
        rating: i32,
        /// When the commit fired
        timestamp: DateTime<Utc>,
    },

    /// A pending submission was discarded before its commit fired
    SubmissionCancelled {
        /// Whose submission was cancelled
        participant: Participant,
        /// Date the discarded rating targeted
        date: chrono::NaiveDate,
        /// When the cancellation occurred
        timestamp: DateTime<Utc>,
    },

    /// A store write failed after the optimistic update was applied
    ///
    /// The optimistic record stays in place; the next authoritative
    /// snapshot supersedes it.
    RatingSaveFailed {
        /// Whose write failed
        participant: Participant,
        /// Date the write targeted
        date: chrono::NaiveDate,
        /// Error message for display
        error: String,
        /// When the failure surfaced
        timestamp: DateTime<Utc>,
    },

    /// Both partners aligned on a qualifying level; fired once per
    /// date+level within a session
    CelebrationTriggered {
        /// Date that qualified
        date: chrono::NaiveDate,
        /// Sync level reached
        level: SyncLevel,
        /// Celebration headline
        title: String,
        /// Celebration body text
        message: String,
        /// Celebratory media reference
        gif_url: String,
        /// When the celebration fired
        timestamp: DateTime<Utc>,
    },

    /// The store subscription ended or the initial load failed
    HistoryLoadFailed {
        /// Error message for display
        error: String,
        /// When the failure surfaced
        timestamp: DateTime<Utc>,
    },
}

impl AppEvent {
    /// Get event type as string for SSE naming and filtering
    pub fn event_type(&self) -> &str {
        match self {
            AppEvent::HistoryUpdated { .. } => "HistoryUpdated",
            AppEvent::SubmissionScheduled { .. } => "SubmissionScheduled",
            AppEvent::SubmissionTick { .. } => "SubmissionTick",
            AppEvent::SubmissionCommitted { .. } => "SubmissionCommitted",
            AppEvent::SubmissionCancelled { .. } => "SubmissionCancelled",
            AppEvent::RatingSaveFailed { .. } => "RatingSaveFailed",
            AppEvent::CelebrationTriggered { .. } => "CelebrationTriggered",
            AppEvent::HistoryLoadFailed { .. } => "HistoryLoadFailed",
        }
    }
}

/// Central event distribution bus
///
/// Wraps tokio::broadcast, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use wavelength_common::events::{AppEvent, EventBus};
///
/// let event_bus = EventBus::new(256);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(AppEvent::HistoryLoadFailed {
///     error: "store went away".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    ///
    /// Events beyond the capacity displace the oldest buffered ones;
    /// lagging subscribers observe a `Lagged` error rather than
    /// blocking emitters.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber
    /// exists, `Err` otherwise.
    pub fn emit(&self, event: AppEvent) -> Result<usize, broadcast::error::SendError<AppEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    ///
    /// Used for events where a missing audience is acceptable, such
    /// as countdown ticks with no SSE clients connected.
    pub fn emit_lossy(&self, event: AppEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
