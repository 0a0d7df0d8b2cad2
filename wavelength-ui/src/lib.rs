//! # Wavelength UI Service (wavelength-ui)
//!
//! Two-person daily mood tracker: each partner submits one rating per
//! day on the -5..5 emoji scale, with an optional note. Submissions
//! wait out a cancellable grace countdown before committing, the
//! joint history is classified into sync levels, and aligned days
//! trigger celebrations. A secondary feature fetches both partners'
//! horoscopes from a generative-language API.
//!
//! **Architecture:** SQLite-backed rating store fanning snapshots out
//! over a watch channel, an in-memory tracker (aggregation, delayed
//! submission, celebration de-dup), and an axum HTTP + SSE surface.

pub mod api;
pub mod db;
pub mod horoscope;
pub mod store;
pub mod tracker;

pub use api::{build_router, AppContext};
