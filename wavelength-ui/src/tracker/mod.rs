//! Daily rating tracker
//!
//! Owns the aggregated rating history, the per-participant pending
//! submission slots, and celebration de-dup for the process lifetime.
//! Saves are optimistic: when a grace countdown lapses the in-memory
//! record updates and events announce the result before the write
//! reaches the store. Authoritative store snapshots arriving on the
//! watch channel re-seed history and supersede optimistic state.

mod celebration;
mod history;
mod submission;

pub use submission::{GracePolicy, PendingState, SaveOutcome};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::time::sleep;
use tracing::{debug, error, info, trace, warn};

use wavelength_common::events::{AppEvent, EventBus};
use wavelength_common::sync::{CelebrationContent, RecordWithSync};
use wavelength_common::{DailyRecord, Participant, RatingPatch, Result, SyncLevel};

use crate::store::{RatingStore, Snapshot};

use celebration::CelebrationTrigger;
use history::RatingHistory;
use submission::PendingSubmission;

/// Today's date in the server's local timezone
///
/// Submissions always target the date current at capture time, so a
/// countdown that crosses midnight still writes to the day the rating
/// was entered on.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Cloneable handle to the shared tracker state
#[derive(Clone)]
pub struct Tracker {
    shared: Arc<TrackerShared>,
}

struct TrackerShared {
    store: Arc<dyn RatingStore>,
    events: EventBus,
    history: RwLock<RatingHistory>,
    pending: Arc<Mutex<HashMap<Participant, PendingSubmission>>>,
    celebrations: Mutex<CelebrationTrigger>,
    policy: GracePolicy,
    commit_tx: mpsc::UnboundedSender<Participant>,
}

impl Tracker {
    /// Seed history from the store's current snapshot and spawn the
    /// background loop that follows snapshot and commit traffic
    ///
    /// Records already present at startup seed the celebration de-dup
    /// set without firing.
    pub fn start(store: Arc<dyn RatingStore>, events: EventBus, policy: GracePolicy) -> Self {
        let mut snapshots = store.subscribe();

        let mut history = RatingHistory::new();
        history.ingest_snapshot(snapshots.borrow_and_update().as_ref().clone());

        let mut celebrations = CelebrationTrigger::new();
        celebrations.seed(history.records());

        info!("Tracker started with {} record(s)", history.len());

        let (commit_tx, commit_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(TrackerShared {
            store,
            events,
            history: RwLock::new(history),
            pending: Arc::new(Mutex::new(HashMap::new())),
            celebrations: Mutex::new(celebrations),
            policy,
            commit_tx,
        });

        tokio::spawn(run_loop(Arc::clone(&shared), snapshots, commit_rx));

        Self { shared }
    }

    /// Capture a rating for today and start its grace countdown
    ///
    /// A second save while the participant's slot is occupied is
    /// rejected without disturbing the running countdown.
    pub async fn save_rating(
        &self,
        participant: Participant,
        rating: i32,
        note: Option<String>,
    ) -> Result<SaveOutcome> {
        let patch = RatingPatch::new(participant, rating, note)?;
        let date = today();
        let policy = self.shared.policy;

        let mut pending = self.shared.pending.lock().await;
        if let Some(existing) = pending.get(&participant) {
            debug!("Save rejected, submission already pending for {}", participant);
            return Ok(SaveOutcome::AlreadyPending(existing.state()));
        }

        // Spawned while the slot lock is held, so the first tick
        // cannot observe the map before the insert below lands.
        let task = tokio::spawn(countdown_task(
            participant,
            policy,
            self.shared.events.clone(),
            Arc::clone(&self.shared.pending),
            self.shared.commit_tx.clone(),
        ));

        let submission = PendingSubmission {
            date,
            patch,
            seconds_remaining: policy.ticks,
            task,
        };
        let state = submission.state();
        pending.insert(participant, submission);
        drop(pending);

        info!(
            "Scheduled {} rating {} for {} ({}s grace)",
            participant, rating, date, policy.ticks
        );
        self.shared.events.emit_lossy(AppEvent::SubmissionScheduled {
            participant,
            date,
            rating,
            grace_seconds: policy.ticks,
            timestamp: Utc::now(),
        });

        Ok(SaveOutcome::Scheduled(state))
    }

    /// Discard a participant's pending submission before it commits
    ///
    /// Returns the discarded slot's state, or `None` when nothing was
    /// pending (including a cancel that lost the race to the commit).
    pub async fn cancel_pending(&self, participant: Participant) -> Option<PendingState> {
        let submission = {
            let mut pending = self.shared.pending.lock().await;
            pending.remove(&participant)?
        };
        submission.task.abort();

        info!(
            "Cancelled pending {} rating for {}",
            participant, submission.date
        );
        self.shared.events.emit_lossy(AppEvent::SubmissionCancelled {
            participant,
            date: submission.date,
            timestamp: Utc::now(),
        });

        Some(submission.state())
    }

    /// Current pending slot state for one participant, if any
    pub async fn pending_state(&self, participant: Participant) -> Option<PendingState> {
        let pending = self.shared.pending.lock().await;
        pending.get(&participant).map(|s| s.state())
    }

    /// Full history, each record annotated with its sync level
    pub async fn history_with_sync(&self) -> Vec<RecordWithSync> {
        self.shared.history_with_sync().await
    }

    /// The aggregated record for one date
    pub async fn record_for(&self, date: NaiveDate) -> Option<DailyRecord> {
        let history = self.shared.history.read().await;
        history.get(date).cloned()
    }

    /// Most recent day whose ratings reached a qualifying level
    pub async fn latest_sync_event(&self) -> Option<(NaiveDate, SyncLevel)> {
        let history = self.shared.history.read().await;
        history.latest_sync_event()
    }

    /// Bus carrying this tracker's events
    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    /// Length of the configured grace countdown
    pub fn grace_seconds(&self) -> u32 {
        self.shared.policy.ticks
    }
}

impl TrackerShared {
    async fn history_with_sync(&self) -> Vec<RecordWithSync> {
        let history = self.history.read().await;
        history
            .records()
            .iter()
            .cloned()
            .map(RecordWithSync::from)
            .collect()
    }

    /// Emit the full annotated history to the bus
    async fn publish_history(&self) {
        let records = self.history_with_sync().await;
        self.events.emit_lossy(AppEvent::HistoryUpdated {
            records,
            timestamp: Utc::now(),
        });
    }

    /// Replace history with an authoritative store snapshot
    ///
    /// Every record is re-evaluated for celebration; the de-dup set
    /// keeps redundant deliveries silent while a record that newly
    /// reached a level (for example the partner's write landing) still
    /// fires.
    async fn handle_snapshot(&self, snapshot: Snapshot) {
        {
            let mut history = self.history.write().await;
            history.ingest_snapshot(snapshot.as_ref().clone());
        }
        self.publish_history().await;

        let fired: Vec<(NaiveDate, SyncLevel, CelebrationContent)> = {
            let history = self.history.read().await;
            let mut celebrations = self.celebrations.lock().await;
            history
                .records()
                .iter()
                .filter_map(|r| {
                    celebrations
                        .evaluate(r)
                        .map(|(level, content)| (r.date, level, content))
                })
                .collect()
        };
        for (date, level, content) in fired {
            self.celebrate(date, level, content);
        }
    }

    /// Commit a participant's pending submission
    ///
    /// The optimistic history update and its events go out first; the
    /// store write follows. A failed write leaves the optimistic
    /// record in place and surfaces as a save-failed event, with the
    /// next authoritative snapshot expected to supersede it.
    async fn commit_pending(&self, participant: Participant) {
        let submission = {
            let mut pending = self.pending.lock().await;
            pending.remove(&participant)
        };

        // A cancel may have taken the slot between the final tick and
        // this commit request.
        let Some(PendingSubmission { date, patch, .. }) = submission else {
            debug!("Commit request for {} found no pending slot", participant);
            return;
        };

        let record = {
            let mut history = self.history.write().await;
            history.apply_optimistic(date, &patch)
        };

        self.publish_history().await;
        self.events.emit_lossy(AppEvent::SubmissionCommitted {
            participant,
            date,
            rating: patch.rating,
            timestamp: Utc::now(),
        });
        info!("Committed {} rating {} for {}", participant, patch.rating, date);

        let fired = {
            let mut celebrations = self.celebrations.lock().await;
            celebrations.evaluate(&record)
        };
        if let Some((level, content)) = fired {
            self.celebrate(record.date, level, content);
        }

        if let Err(e) = self.store.merge_write(date, &patch).await {
            error!("Rating write failed for {} on {}: {}", participant, date, e);
            self.events.emit_lossy(AppEvent::RatingSaveFailed {
                participant,
                date,
                error: e.to_string(),
                timestamp: Utc::now(),
            });
        }
    }

    fn celebrate(&self, date: NaiveDate, level: SyncLevel, content: CelebrationContent) {
        info!("Celebration on {}: {} ({})", date, content.title, level.label());
        self.events.emit_lossy(AppEvent::CelebrationTriggered {
            date,
            level,
            title: content.title.to_string(),
            message: content.message.to_string(),
            gif_url: content.gif_url.to_string(),
            timestamp: Utc::now(),
        });
    }
}

/// Background loop following store snapshots and commit requests
///
/// Ends when the store's watch channel closes; that surfaces to
/// clients as a history-load failure rather than a silent stall.
async fn run_loop(
    shared: Arc<TrackerShared>,
    mut snapshots: watch::Receiver<Snapshot>,
    mut commit_rx: mpsc::UnboundedReceiver<Participant>,
) {
    loop {
        tokio::select! {
            changed = snapshots.changed() => match changed {
                Ok(()) => {
                    let snapshot = snapshots.borrow_and_update().clone();
                    shared.handle_snapshot(snapshot).await;
                }
                Err(_) => {
                    warn!("Store subscription closed; history updates stopped");
                    shared.events.emit_lossy(AppEvent::HistoryLoadFailed {
                        error: "store subscription closed".to_string(),
                        timestamp: Utc::now(),
                    });
                    break;
                }
            },
            request = commit_rx.recv() => match request {
                Some(participant) => shared.commit_pending(participant).await,
                None => break,
            },
        }
    }
}

/// Per-participant grace countdown
///
/// Decrements the pending slot once per tick, announcing each
/// remaining-seconds value, and requests the commit after the final
/// tick. Exits quietly if the slot disappears underneath it.
async fn countdown_task(
    participant: Participant,
    policy: GracePolicy,
    events: EventBus,
    pending: Arc<Mutex<HashMap<Participant, PendingSubmission>>>,
    commit_tx: mpsc::UnboundedSender<Participant>,
) {
    for _ in 0..policy.ticks {
        sleep(policy.tick).await;

        let seconds_remaining = {
            let mut slots = pending.lock().await;
            let Some(slot) = slots.get_mut(&participant) else {
                return;
            };
            slot.seconds_remaining = slot.seconds_remaining.saturating_sub(1);
            slot.seconds_remaining
        };

        trace!("{} countdown: {}s remaining", participant, seconds_remaining);
        events.emit_lossy(AppEvent::SubmissionTick {
            participant,
            seconds_remaining,
            timestamp: Utc::now(),
        });
    }

    let _ = commit_tx.send(participant);
}
