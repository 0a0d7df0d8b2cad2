//! # Wavelength Common Library
//!
//! Shared code for the Wavelength mood tracker:
//! - Daily record model and participant types
//! - Sync level classification and celebration payloads
//! - Event types (AppEvent enum) and the broadcast event bus
//! - Configuration and data directory resolution
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod sync;

pub use error::{Error, Result};
pub use model::{DailyRecord, Participant, RatingPatch};
pub use sync::SyncLevel;
