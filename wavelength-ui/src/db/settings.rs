//! Settings database access
//!
//! Read/write settings from the settings table (key-value store).
//! All settings are global (not per-user): participant profiles and
//! the submission grace period.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use wavelength_common::{Error, Participant, Result};

/// Default undo window length in seconds
pub const DEFAULT_GRACE_SECONDS: u32 = 60;

/// Display name and zodiac sign for one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantProfile {
    pub name: String,
    pub sign: String,
}

/// Load both participants' profiles
pub async fn load_participant_profiles(
    db: &Pool<Sqlite>,
) -> Result<[(Participant, ParticipantProfile); 2]> {
    let mut profiles = Vec::with_capacity(2);

    for participant in Participant::ALL {
        let name_key = format!("{}_name", participant.as_str());
        let sign_key = format!("{}_sign", participant.as_str());

        let name = get_setting::<String>(db, &name_key)
            .await?
            .ok_or_else(|| Error::Config(format!("Missing setting '{}'", name_key)))?;
        let sign = get_setting::<String>(db, &sign_key)
            .await?
            .ok_or_else(|| Error::Config(format!("Missing setting '{}'", sign_key)))?;

        profiles.push((participant, ParticipantProfile { name, sign }));
    }

    Ok([profiles[0].clone(), profiles[1].clone()])
}

/// Update one participant's display name and zodiac sign
pub async fn set_participant_profile(
    db: &Pool<Sqlite>,
    participant: Participant,
    profile: &ParticipantProfile,
) -> Result<()> {
    set_setting(
        db,
        &format!("{}_name", participant.as_str()),
        profile.name.clone(),
    )
    .await?;
    set_setting(
        db,
        &format!("{}_sign", participant.as_str()),
        profile.sign.clone(),
    )
    .await
}

/// Length of the submission undo window, clamped to 1..=600 seconds
pub async fn get_grace_seconds(db: &Pool<Sqlite>) -> Result<u32> {
    match get_setting::<u32>(db, "grace_period_seconds").await? {
        Some(seconds) => Ok(seconds.clamp(1, 600)),
        None => Ok(DEFAULT_GRACE_SECONDS),
    }
}

/// Generic setting getter
///
/// Returns None if key doesn't exist in database. Parses value from
/// string using FromStr.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter (insert or update)
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    let value_str = value.to_string();

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}
