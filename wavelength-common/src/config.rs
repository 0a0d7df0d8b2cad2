//! Configuration loading and data directory resolution

use std::path::{Path, PathBuf};

use tracing::info;

use crate::Result;

/// Database file name inside the data directory
pub const DATABASE_FILE: &str = "wavelength.db";

/// Resolve the data directory, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. OS-dependent compiled default (fallback)
pub fn resolve_data_dir(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: OS-dependent compiled default
    default_data_dir()
}

/// Get OS-dependent default data directory
fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/wavelength
        dirs::data_local_dir()
            .map(|d| d.join("wavelength"))
            .unwrap_or_else(|| PathBuf::from("./wavelength_data"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/wavelength
        dirs::data_dir()
            .map(|d| d.join("wavelength"))
            .unwrap_or_else(|| PathBuf::from("./wavelength_data"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\wavelength
        dirs::data_local_dir()
            .map(|d| d.join("wavelength"))
            .unwrap_or_else(|| PathBuf::from("./wavelength_data"))
    } else {
        PathBuf::from("./wavelength_data")
    }
}

/// Create the data directory if missing and log the resolved location
pub fn ensure_data_dir(data_dir: &Path) -> Result<()> {
    if !data_dir.exists() {
        std::fs::create_dir_all(data_dir)?;
        info!("Created data directory: {}", data_dir.display());
    } else {
        info!("Using data directory: {}", data_dir.display());
    }
    Ok(())
}

/// Path of the database file inside the data directory
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILE)
}

/// SQLite connection URL that creates the database file if missing
pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite:{}?mode=rwc", database_path(data_dir).display())
}
