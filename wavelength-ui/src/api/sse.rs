//! Server-Sent Events (SSE) broadcaster
//!
//! Streams application events to connected pages. Each new client
//! first receives the current aggregated history, then live events as
//! they occur.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use chrono::Utc;
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use wavelength_common::events::AppEvent;

use crate::api::server::AppContext;

/// GET /api/events - SSE event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New SSE client connected");

    // Subscribe before snapshotting: events landing in between are
    // duplicated rather than lost, and HistoryUpdated is a full
    // replace so duplicates are harmless.
    let rx = ctx.tracker.events().subscribe();
    let initial = AppEvent::HistoryUpdated {
        records: ctx.tracker.history_with_sync().await,
        timestamp: Utc::now(),
    };

    let stream = async_stream::stream! {
        if let Some(event) = encode_event(&initial) {
            yield Ok(event);
        }

        let mut events = BroadcastStream::new(rx);
        while let Some(result) = events.next().await {
            match result {
                Ok(app_event) => {
                    if let Some(event) = encode_event(&app_event) {
                        yield Ok(event);
                    }
                }
                Err(e) => {
                    // Lagged subscriber; skip missed events
                    warn!("SSE stream error: {:?}", e);
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Serialize one event for the wire, named by its type
fn encode_event(event: &AppEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event.event_type()).data(json)),
        Err(e) => {
            warn!("Failed to serialize event: {}", e);
            None
        }
    }
}
