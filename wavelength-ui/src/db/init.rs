//! Database initialization
//!
//! Creates the schema on first start and seeds missing settings with
//! their defaults. Safe to run on every startup.

use sqlx::{Pool, Sqlite};
use tracing::info;

use wavelength_common::Result;

/// Settings seeded when absent. Values are editable afterwards.
const SETTINGS_DEFAULTS: &[(&str, &str)] = &[
    // Participant profiles
    ("person1_name", "Person 1"),
    ("person2_name", "Person 2"),
    ("person1_sign", "Pisces"),
    ("person2_sign", "Leo"),
    // Undo window for rating submissions
    ("grace_period_seconds", "60"),
];

/// Create tables if missing and seed default settings
pub async fn init_schema(pool: &Pool<Sqlite>) -> Result<()> {
    info!("Initializing database schema");

    // The shared rating store. One row per calendar day; either
    // participant's pair of columns may be NULL.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ratings (
            date TEXT PRIMARY KEY,
            person1_rating INTEGER,
            person2_rating INTEGER,
            person1_note TEXT,
            person2_note TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    init_settings_defaults(pool).await?;

    Ok(())
}

/// Seed missing settings with default values
async fn init_settings_defaults(pool: &Pool<Sqlite>) -> Result<()> {
    for (key, default_value) in SETTINGS_DEFAULTS {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
                .bind(key)
                .fetch_one(pool)
                .await?;

        if !exists {
            sqlx::query("INSERT INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;

            info!(
                "Initialized setting '{}' with default value: {}",
                key, default_value
            );
        }
    }

    Ok(())
}
