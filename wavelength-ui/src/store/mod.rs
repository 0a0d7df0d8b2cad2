//! Rating store abstraction
//!
//! The store holds one document per calendar date and fans the full,
//! date-ordered record set out to subscribers after every change.
//! The production implementation is SQLite-backed; tests substitute
//! scripted implementations of the same trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::watch;

use wavelength_common::{DailyRecord, RatingPatch, Result};

mod sqlite;

pub use sqlite::SqliteRatingStore;

/// Full record set delivered to subscribers, ascending by date
pub type Snapshot = Arc<Vec<DailyRecord>>;

/// Keyed document store for daily ratings
///
/// `merge_write` upserts one participant's field pair without
/// touching the other side's. `subscribe` returns a watch receiver
/// that holds the current snapshot and yields the complete ordered
/// set after every committed write; dropping the receiver
/// unsubscribes. When the store is torn down the channel closes,
/// which subscribers observe as the end of updates.
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Load the full date-ordered record set
    async fn load_all(&self) -> Result<Vec<DailyRecord>>;

    /// Merge one participant's rating/note into the record for
    /// `date`, creating the record if absent
    async fn merge_write(&self, date: NaiveDate, patch: &RatingPatch) -> Result<()>;

    /// Subscribe to snapshot deliveries
    fn subscribe(&self) -> watch::Receiver<Snapshot>;
}
