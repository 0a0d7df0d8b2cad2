//! REST API implementation for the Wavelength UI service
//!
//! Endpoints cover participants, rating history, delayed rating
//! submission, sync lookups, horoscopes, and the SSE event stream.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{build_router, AppContext};
