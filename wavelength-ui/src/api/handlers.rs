//! HTTP request handlers
//!
//! Implements the REST endpoints for participants, ratings, sync
//! lookups, and horoscopes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use wavelength_common::model::{RATING_EMOJI, RATING_MAX, RATING_MIN};
use wavelength_common::sync::{CelebrationContent, RecordWithSync};
use wavelength_common::{Error, Participant, SyncLevel};

use crate::api::server::AppContext;
use crate::db::{load_participant_profiles, set_participant_profile, ParticipantProfile};
use crate::horoscope::HoroscopeError;
use crate::tracker::{today, PendingState, SaveOutcome};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Serialize)]
pub struct ParticipantsResponse {
    participants: Vec<ParticipantInfo>,
    emoji_scale: Vec<&'static str>,
    rating_min: i32,
    rating_max: i32,
}

#[derive(Debug, Serialize)]
pub struct ParticipantInfo {
    id: Participant,
    name: String,
    sign: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateParticipantRequest {
    name: String,
    sign: String,
}

#[derive(Debug, Serialize)]
pub struct RatingsResponse {
    records: Vec<RecordWithSync>,
}

#[derive(Debug, Serialize)]
pub struct TodayResponse {
    date: NaiveDate,
    record: Option<RecordWithSync>,
    pending: TodayPending,
}

#[derive(Debug, Serialize)]
pub struct TodayPending {
    person1: Option<PendingState>,
    person2: Option<PendingState>,
}

#[derive(Debug, Deserialize)]
pub struct SaveRatingRequest {
    participant: Participant,
    rating: i32,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveRatingResponse {
    status: String,
    pending: PendingState,
    grace_seconds: u32,
}

#[derive(Debug, Deserialize)]
pub struct CancelRatingRequest {
    participant: Participant,
}

#[derive(Debug, Serialize)]
pub struct CancelRatingResponse {
    status: String,
    cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct LatestSyncResponse {
    date: Option<NaiveDate>,
    level: Option<SyncLevel>,
    celebration: Option<CelebrationContent>,
}

#[derive(Debug, Serialize)]
pub struct HoroscopeResponse {
    horoscopes: Vec<HoroscopeEntry>,
}

#[derive(Debug, Serialize)]
pub struct HoroscopeEntry {
    participant: Participant,
    sign: String,
    text: String,
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "wavelength-ui".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Participant Endpoints
// ============================================================================

/// GET /api/participants - Both participants' profiles and the scale
pub async fn get_participants(
    State(ctx): State<AppContext>,
) -> Result<Json<ParticipantsResponse>, (StatusCode, Json<StatusResponse>)> {
    match load_participant_profiles(&ctx.db_pool).await {
        Ok(profiles) => {
            let participants = profiles
                .into_iter()
                .map(|(id, profile)| ParticipantInfo {
                    id,
                    name: profile.name,
                    sign: profile.sign,
                })
                .collect();

            Ok(Json(ParticipantsResponse {
                participants,
                emoji_scale: RATING_EMOJI.to_vec(),
                rating_min: RATING_MIN,
                rating_max: RATING_MAX,
            }))
        }
        Err(e) => {
            error!("Failed to load participant profiles: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse {
                    status: format!("error: {}", e),
                }),
            ))
        }
    }
}

/// PUT /api/participants/:id - Update one participant's name and sign
pub async fn update_participant(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(req): Json<UpdateParticipantRequest>,
) -> Result<Json<ParticipantInfo>, (StatusCode, Json<StatusResponse>)> {
    let participant = match Participant::ALL.into_iter().find(|p| p.as_str() == id) {
        Some(p) => p,
        None => {
            let e = Error::NotFound(format!("no participant with id '{}'", id));
            return Err((
                StatusCode::NOT_FOUND,
                Json(StatusResponse {
                    status: format!("error: {}", e),
                }),
            ));
        }
    };

    let name = req.name.trim().to_string();
    let sign = req.sign.trim().to_string();
    if name.is_empty() || sign.is_empty() {
        let e = Error::InvalidInput("participant name and sign must not be empty".to_string());
        return Err((
            StatusCode::BAD_REQUEST,
            Json(StatusResponse {
                status: format!("error: {}", e),
            }),
        ));
    }

    info!("Updating profile for {}: {} ({})", participant, name, sign);

    let profile = ParticipantProfile { name, sign };
    match set_participant_profile(&ctx.db_pool, participant, &profile).await {
        Ok(()) => Ok(Json(ParticipantInfo {
            id: participant,
            name: profile.name,
            sign: profile.sign,
        })),
        Err(e) => {
            error!("Failed to update participant profile: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse {
                    status: format!("error: {}", e),
                }),
            ))
        }
    }
}

// ============================================================================
// Rating Endpoints
// ============================================================================

/// GET /api/ratings - Full history with derived sync levels
pub async fn get_ratings(State(ctx): State<AppContext>) -> Json<RatingsResponse> {
    Json(RatingsResponse {
        records: ctx.tracker.history_with_sync().await,
    })
}

/// GET /api/ratings/today - Today's record plus pending submissions
pub async fn get_today(State(ctx): State<AppContext>) -> Json<TodayResponse> {
    let date = today();
    let record = ctx.tracker.record_for(date).await.map(RecordWithSync::from);
    let pending = TodayPending {
        person1: ctx.tracker.pending_state(Participant::Person1).await,
        person2: ctx.tracker.pending_state(Participant::Person2).await,
    };

    Json(TodayResponse {
        date,
        record,
        pending,
    })
}

/// POST /api/ratings - Schedule a delayed rating submission for today
pub async fn save_rating(
    State(ctx): State<AppContext>,
    Json(req): Json<SaveRatingRequest>,
) -> Result<Json<SaveRatingResponse>, (StatusCode, Json<StatusResponse>)> {
    info!("Save rating request: {} -> {}", req.participant, req.rating);

    match ctx
        .tracker
        .save_rating(req.participant, req.rating, req.note)
        .await
    {
        Ok(SaveOutcome::Scheduled(pending)) => Ok(Json(SaveRatingResponse {
            status: "pending".to_string(),
            pending,
            grace_seconds: ctx.tracker.grace_seconds(),
        })),
        Ok(SaveOutcome::AlreadyPending(_)) => Err((
            StatusCode::CONFLICT,
            Json(StatusResponse {
                status: "error: a submission is already pending for this participant".to_string(),
            }),
        )),
        Err(e @ Error::InvalidInput(_)) => Err((
            StatusCode::BAD_REQUEST,
            Json(StatusResponse {
                status: format!("error: {}", e),
            }),
        )),
        Err(e) => {
            error!("Failed to schedule rating: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse {
                    status: format!("error: {}", e),
                }),
            ))
        }
    }
}

/// POST /api/ratings/cancel - Cancel a pending submission
pub async fn cancel_rating(
    State(ctx): State<AppContext>,
    Json(req): Json<CancelRatingRequest>,
) -> Json<CancelRatingResponse> {
    let cancelled = ctx.tracker.cancel_pending(req.participant).await;

    Json(CancelRatingResponse {
        status: "ok".to_string(),
        cancelled: cancelled.is_some(),
    })
}

// ============================================================================
// Sync Endpoints
// ============================================================================

/// GET /api/sync/latest - Most recent qualifying day, if any
pub async fn get_latest_sync(State(ctx): State<AppContext>) -> Json<LatestSyncResponse> {
    match ctx.tracker.latest_sync_event().await {
        Some((date, level)) => Json(LatestSyncResponse {
            date: Some(date),
            level: Some(level),
            celebration: level.celebration(),
        }),
        None => Json(LatestSyncResponse {
            date: None,
            level: None,
            celebration: None,
        }),
    }
}

// ============================================================================
// Horoscope Endpoint
// ============================================================================

/// GET /api/horoscope - Both participants' horoscopes
///
/// The two fetches run concurrently; either failing fails the whole
/// response, so no partial reading is ever returned.
pub async fn get_horoscope(
    State(ctx): State<AppContext>,
) -> Result<Json<HoroscopeResponse>, (StatusCode, Json<StatusResponse>)> {
    let profiles = match load_participant_profiles(&ctx.db_pool).await {
        Ok(profiles) => profiles,
        Err(e) => {
            error!("Failed to load participant profiles: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse {
                    status: format!("error: {}", e),
                }),
            ));
        }
    };
    let [(person1, profile1), (person2, profile2)] = profiles;

    match ctx.horoscope.fetch_pair(&profile1.sign, &profile2.sign).await {
        Ok((text1, text2)) => Ok(Json(HoroscopeResponse {
            horoscopes: vec![
                HoroscopeEntry {
                    participant: person1,
                    sign: profile1.sign,
                    text: text1,
                },
                HoroscopeEntry {
                    participant: person2,
                    sign: profile2.sign,
                    text: text2,
                },
            ],
        })),
        Err(e) => {
            error!("Horoscope fetch failed: {}", e);
            let status = match &e {
                HoroscopeError::MissingKey | HoroscopeError::InvalidKey => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                HoroscopeError::Unavailable(_) | HoroscopeError::Fetch(_) => {
                    StatusCode::BAD_GATEWAY
                }
                HoroscopeError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((
                status,
                Json(StatusResponse {
                    status: format!("error: {}", e),
                }),
            ))
        }
    }
}
