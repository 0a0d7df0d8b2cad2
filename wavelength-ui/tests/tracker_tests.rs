//! Integration tests for the rating tracker over a real SQLite store
//!
//! Tests cover:
//! - Delayed commit flowing through merge_write and back via the snapshot loop
//! - Cancellation inside the grace window leaving no trace in store or history
//! - Dual alignment firing exactly one celebration per date+level
//! - Startup seeding suppressing celebrations for historical records
//! - External store writes converging into tracker history
//! - Mid-countdown snapshots leaving the pending submission untouched
//! - Store write failure keeping the optimistic record in place

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tokio::sync::{broadcast, watch};
use tokio::time::timeout;

use wavelength_common::events::{AppEvent, EventBus};
use wavelength_common::{DailyRecord, Error, Participant, RatingPatch, Result, SyncLevel};
use wavelength_ui::db::init_schema;
use wavelength_ui::store::{RatingStore, Snapshot, SqliteRatingStore};
use wavelength_ui::tracker::{today, GracePolicy, SaveOutcome, Tracker};

/// Test helper: SQLite-backed store over a fresh in-memory database
async fn memory_store() -> Arc<SqliteRatingStore> {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    init_schema(&pool).await.expect("Should initialize schema");
    Arc::new(
        SqliteRatingStore::new(pool)
            .await
            .expect("Should create store"),
    )
}

/// Test helper: millisecond ticks so the full pending lifecycle runs fast
fn fast_policy(ticks: u32) -> GracePolicy {
    GracePolicy {
        ticks,
        tick: Duration::from_millis(10),
    }
}

fn date(s: &str) -> NaiveDate {
    s.parse().expect("Should parse date literal")
}

/// Test helper: wait for the next event of the named type, skipping others
async fn wait_for(rx: &mut broadcast::Receiver<AppEvent>, event_type: &str) -> AppEvent {
    loop {
        let event = timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap_or_else(|_| panic!("Timed out waiting for {}", event_type))
            .expect("Event bus closed");
        if event.event_type() == event_type {
            return event;
        }
    }
}

/// Test helper: collect everything already sitting in the subscription
fn drain(rx: &mut broadcast::Receiver<AppEvent>) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// =============================================================================
// Delayed Commit Round Trip
// =============================================================================

#[tokio::test]
async fn test_commit_persists_through_store_roundtrip() {
    let store = memory_store().await;
    let tracker = Tracker::start(store.clone(), EventBus::new(64), fast_policy(2));
    let mut rx = tracker.events().subscribe();

    let outcome = tracker
        .save_rating(Participant::Person1, 4, Some("good day".to_string()))
        .await
        .expect("Save should schedule");
    assert!(matches!(outcome, SaveOutcome::Scheduled(state) if state.rating == 4));

    wait_for(&mut rx, "SubmissionCommitted").await;
    // The authoritative snapshot publishes after the write lands.
    wait_for(&mut rx, "HistoryUpdated").await;

    let record = tracker
        .record_for(today())
        .await
        .expect("Today's record should exist");
    assert_eq!(record.person1_rating, Some(4));
    assert_eq!(record.person1_note.as_deref(), Some("good day"));
    assert_eq!(record.person2_rating, None);

    let persisted = store.load_all().await.expect("Load should succeed");
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].person1_rating, Some(4));

    assert!(tracker.pending_state(Participant::Person1).await.is_none());
}

// =============================================================================
// Cancellation Inside the Grace Window
// =============================================================================

#[tokio::test]
async fn test_cancel_during_countdown_leaves_no_trace() {
    let store = memory_store().await;
    let tracker = Tracker::start(store.clone(), EventBus::new(64), fast_policy(5));
    let mut rx = tracker.events().subscribe();

    tracker
        .save_rating(Participant::Person1, 5, None)
        .await
        .expect("Save should schedule");

    // The countdown is running once the first tick lands.
    wait_for(&mut rx, "SubmissionTick").await;

    let discarded = tracker
        .cancel_pending(Participant::Person1)
        .await
        .expect("Cancel should return the discarded slot");
    assert_eq!(discarded.rating, 5);

    wait_for(&mut rx, "SubmissionCancelled").await;

    // Wait past where every remaining tick would have fired.
    tokio::time::sleep(Duration::from_millis(150)).await;

    let trailing = drain(&mut rx);
    assert!(
        !trailing
            .iter()
            .any(|e| e.event_type() == "SubmissionCommitted"),
        "Cancelled submission should never commit"
    );

    assert!(tracker.record_for(today()).await.is_none());
    assert!(tracker.pending_state(Participant::Person1).await.is_none());
    let persisted = store.load_all().await.expect("Load should succeed");
    assert!(persisted.is_empty());
}

// =============================================================================
// Celebration Dedup Across Optimistic and Authoritative Updates
// =============================================================================

#[tokio::test]
async fn test_dual_alignment_fires_single_celebration() {
    let store = memory_store().await;
    let tracker = Tracker::start(store.clone(), EventBus::new(64), fast_policy(1));
    let mut rx = tracker.events().subscribe();

    tracker
        .save_rating(Participant::Person1, 4, None)
        .await
        .expect("First save should schedule");
    tracker
        .save_rating(Participant::Person2, 4, None)
        .await
        .expect("Second save should schedule");

    let event = wait_for(&mut rx, "CelebrationTriggered").await;
    let AppEvent::CelebrationTriggered {
        date: fired_date,
        level,
        title,
        ..
    } = event
    else {
        panic!("Wrong event variant");
    };
    assert_eq!(fired_date, today());
    assert_eq!(level, SyncLevel::SuperSync);
    assert_eq!(title, "Perfect Harmony!");

    // Let both authoritative snapshots flow back through the loop;
    // redelivery of the same date+level must stay silent.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let trailing = drain(&mut rx);
    assert!(
        !trailing
            .iter()
            .any(|e| e.event_type() == "CelebrationTriggered"),
        "Same date+level should celebrate only once"
    );

    let record = tracker
        .record_for(today())
        .await
        .expect("Today's record should exist");
    assert_eq!(record.person1_rating, Some(4));
    assert_eq!(record.person2_rating, Some(4));

    let history = tracker.history_with_sync().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sync_level, SyncLevel::SuperSync);
}

// =============================================================================
// Startup Seeding
// =============================================================================

#[tokio::test]
async fn test_preexisting_alignment_does_not_celebrate_on_startup() {
    let store = memory_store().await;
    let past = date("2025-06-01");
    store
        .merge_write(past, &RatingPatch::new(Participant::Person1, 3, None).unwrap())
        .await
        .expect("Seed write should succeed");
    store
        .merge_write(past, &RatingPatch::new(Participant::Person2, 3, None).unwrap())
        .await
        .expect("Seed write should succeed");

    let tracker = Tracker::start(store.clone(), EventBus::new(64), fast_policy(1));
    let mut rx = tracker.events().subscribe();

    assert_eq!(
        tracker.latest_sync_event().await,
        Some((past, SyncLevel::Sync))
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    let events = drain(&mut rx);
    assert!(
        !events
            .iter()
            .any(|e| e.event_type() == "CelebrationTriggered"),
        "Historical alignment should not celebrate at startup"
    );
}

// =============================================================================
// External Write Convergence
// =============================================================================

#[tokio::test]
async fn test_external_store_write_converges_into_history() {
    let store = memory_store().await;
    let tracker = Tracker::start(store.clone(), EventBus::new(64), fast_policy(1));
    let mut rx = tracker.events().subscribe();

    // Write around the tracker, straight into the store.
    store
        .merge_write(
            date("2025-06-02"),
            &RatingPatch::new(Participant::Person2, 5, Some("surprise".to_string())).unwrap(),
        )
        .await
        .expect("Direct write should succeed");

    wait_for(&mut rx, "HistoryUpdated").await;

    let record = tracker
        .record_for(date("2025-06-02"))
        .await
        .expect("Snapshot should have delivered the record");
    assert_eq!(record.person2_rating, Some(5));
    assert_eq!(record.person2_note.as_deref(), Some("surprise"));
}

#[tokio::test]
async fn test_snapshot_during_countdown_preserves_pending() {
    let store = memory_store().await;
    let tracker = Tracker::start(store.clone(), EventBus::new(64), fast_policy(50));
    let mut rx = tracker.events().subscribe();

    tracker
        .save_rating(Participant::Person1, 4, None)
        .await
        .expect("Save should schedule");
    wait_for(&mut rx, "SubmissionTick").await;

    // A write from outside arrives while the countdown is running.
    store
        .merge_write(
            date("2025-06-07"),
            &RatingPatch::new(Participant::Person2, 2, None).unwrap(),
        )
        .await
        .expect("Direct write should succeed");
    wait_for(&mut rx, "HistoryUpdated").await;

    // The snapshot was ingested without touching the pending slot.
    let pending = tracker
        .pending_state(Participant::Person1)
        .await
        .expect("Pending submission should survive the snapshot");
    assert_eq!(pending.date, today());
    assert_eq!(pending.rating, 4);
    assert!(pending.seconds_remaining > 0);
    assert_eq!(
        tracker
            .record_for(date("2025-06-07"))
            .await
            .expect("External day should be in history")
            .person2_rating,
        Some(2)
    );

    // The countdown still runs to completion and commits.
    wait_for(&mut rx, "SubmissionCommitted").await;
    wait_for(&mut rx, "HistoryUpdated").await;

    let committed = tracker
        .record_for(today())
        .await
        .expect("Commit should have landed");
    assert_eq!(committed.person1_rating, Some(4));
    assert!(tracker.pending_state(Participant::Person1).await.is_none());
}

// =============================================================================
// Store Write Failure
// =============================================================================

/// Store whose writes always fail, for exercising the failure path
struct FailingStore {
    snapshot_tx: watch::Sender<Snapshot>,
}

impl FailingStore {
    fn new() -> Self {
        Self {
            snapshot_tx: watch::channel(Arc::new(Vec::<DailyRecord>::new())).0,
        }
    }
}

#[async_trait]
impl RatingStore for FailingStore {
    async fn load_all(&self) -> Result<Vec<DailyRecord>> {
        Ok(self.snapshot_tx.borrow().as_ref().clone())
    }

    async fn merge_write(&self, _date: NaiveDate, _patch: &RatingPatch) -> Result<()> {
        Err(Error::Internal("write refused".to_string()))
    }

    fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }
}

#[tokio::test]
async fn test_write_failure_keeps_optimistic_record() {
    let store = Arc::new(FailingStore::new());
    let tracker = Tracker::start(store, EventBus::new(64), fast_policy(1));
    let mut rx = tracker.events().subscribe();

    tracker
        .save_rating(Participant::Person1, 3, None)
        .await
        .expect("Save should schedule");

    let event = wait_for(&mut rx, "RatingSaveFailed").await;
    let AppEvent::RatingSaveFailed {
        participant, error, ..
    } = event
    else {
        panic!("Wrong event variant");
    };
    assert_eq!(participant, Participant::Person1);
    assert!(error.contains("write refused"));

    // The optimistic record stays until an authoritative snapshot
    // supersedes it.
    let record = tracker
        .record_for(today())
        .await
        .expect("Optimistic record should remain");
    assert_eq!(record.person1_rating, Some(3));
}
