//! Unit tests for configuration and data directory resolution
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.
//! Tests that manipulate WAVELENGTH_DATA_DIR are marked with
//! #[serial] so they run sequentially, not in parallel.

use std::env;
use std::path::PathBuf;

use serial_test::serial;
use wavelength_common::config::{database_path, ensure_data_dir, resolve_data_dir};

const ENV_KEY: &str = "WAVELENGTH_DATA_DIR";

#[test]
#[serial]
fn test_env_var_wins_over_default() {
    env::set_var(ENV_KEY, "/env/dir");
    let dir = resolve_data_dir(None, ENV_KEY);
    env::remove_var(ENV_KEY);

    assert_eq!(dir, PathBuf::from("/env/dir"));
}

#[test]
#[serial]
fn test_cli_arg_wins_over_env() {
    env::set_var(ENV_KEY, "/env/dir");
    let dir = resolve_data_dir(Some("/cli/dir"), ENV_KEY);
    env::remove_var(ENV_KEY);

    assert_eq!(dir, PathBuf::from("/cli/dir"));
}

#[test]
#[serial]
fn test_empty_env_var_falls_back_to_default() {
    env::set_var(ENV_KEY, "");
    let dir = resolve_data_dir(None, ENV_KEY);
    env::remove_var(ENV_KEY);

    assert_ne!(dir, PathBuf::from(""));
    assert!(!dir.as_os_str().is_empty());
}

#[test]
fn test_ensure_data_dir_creates_missing_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let nested = tmp.path().join("a").join("b");

    assert!(!nested.exists());
    ensure_data_dir(&nested).unwrap();
    assert!(nested.is_dir());

    // Idempotent on an existing directory
    ensure_data_dir(&nested).unwrap();

    let db = database_path(&nested);
    assert!(db.ends_with("wavelength.db"));
}
