//! SQLite-backed rating store
//!
//! Each merge write touches exactly one participant's column pair,
//! then republishes the full ordered record set to watch subscribers.
//! The reload-then-broadcast keeps subscribers' view authoritative:
//! whatever the database holds after the write is what everyone sees.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tokio::sync::watch;
use tracing::debug;

use wavelength_common::{DailyRecord, Participant, RatingPatch, Result};

use super::{RatingStore, Snapshot};

pub struct SqliteRatingStore {
    pool: SqlitePool,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl SqliteRatingStore {
    /// Open over an initialized pool and publish the initial snapshot
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let records = load_all_records(&pool).await?;
        let (snapshot_tx, _) = watch::channel(Arc::new(records));

        Ok(Self { pool, snapshot_tx })
    }

    /// Reload from the database and replace the published snapshot
    async fn publish(&self) -> Result<()> {
        let records = load_all_records(&self.pool).await?;
        self.snapshot_tx.send_replace(Arc::new(records));
        Ok(())
    }
}

async fn load_all_records(pool: &SqlitePool) -> Result<Vec<DailyRecord>> {
    let records = sqlx::query_as::<_, DailyRecord>(
        r#"
        SELECT date, person1_rating, person2_rating, person1_note, person2_note
        FROM ratings
        ORDER BY date ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(records)
}

#[async_trait]
impl RatingStore for SqliteRatingStore {
    async fn load_all(&self) -> Result<Vec<DailyRecord>> {
        load_all_records(&self.pool).await
    }

    async fn merge_write(&self, date: NaiveDate, patch: &RatingPatch) -> Result<()> {
        let sql = match patch.participant {
            Participant::Person1 => {
                r#"
                INSERT INTO ratings (date, person1_rating, person1_note)
                VALUES (?, ?, ?)
                ON CONFLICT(date) DO UPDATE SET
                    person1_rating = excluded.person1_rating,
                    person1_note = excluded.person1_note
                "#
            }
            Participant::Person2 => {
                r#"
                INSERT INTO ratings (date, person2_rating, person2_note)
                VALUES (?, ?, ?)
                ON CONFLICT(date) DO UPDATE SET
                    person2_rating = excluded.person2_rating,
                    person2_note = excluded.person2_note
                "#
            }
        };

        sqlx::query(sql)
            .bind(date)
            .bind(patch.rating)
            .bind(&patch.note)
            .execute(&self.pool)
            .await?;

        debug!(
            participant = %patch.participant,
            date = %date,
            rating = patch.rating,
            "Merged rating into store"
        );

        self.publish().await
    }

    fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }
}
