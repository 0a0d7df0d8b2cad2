//! Database access layer for wavelength-ui
//!
//! One SQLite file holds both tables: `ratings` (the shared document
//! store, keyed by calendar date) and `settings` (key-value
//! configuration).

use std::path::Path;

use sqlx::SqlitePool;
use tracing::info;

use wavelength_common::{config, Result};

mod init;
mod settings;

pub use init::init_schema;
pub use settings::{
    get_grace_seconds, get_setting, load_participant_profiles, set_participant_profile,
    set_setting, ParticipantProfile,
};

/// Connect to the database, creating the file if missing
pub async fn connect(data_dir: &Path) -> Result<SqlitePool> {
    let db_url = config::database_url(data_dir);
    let pool = SqlitePool::connect(&db_url).await?;

    info!(
        "Connected to database: {}",
        config::database_path(data_dir).display()
    );

    Ok(pool)
}
