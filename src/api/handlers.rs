//! Request Handlers
//!
//! Thin wrappers over [`GameProcessor`]; every room mutation is authenticated,
//! verification is public.

use super::{
    errors::ApiError,
    middleware::{AuthenticatedUser, RequestId},
    models::*,
};
use crate::{
    auth::SessionValidator,
    games::{verify, CoinSide, GameProcessor, Verification},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::{sync::Arc, time::Duration};

/// Shared application state
pub struct AppState {
    pub processor: Arc<GameProcessor>,
    pub sessions: SessionValidator,
    /// Pause before a flip result is returned, for client animations
    pub reveal_delay: Duration,
    pub version: String,
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
    })
}

/// POST /api/verify
pub async fn verify_handler(Json(request): Json<VerifyRequest>) -> Json<Verification> {
    let nonce = request.nonce_text();
    Json(verify::verify(
        request.server_seed.as_deref().unwrap_or_default(),
        request.player_seed.as_deref().unwrap_or_default(),
        &nonce,
        request.digest.as_deref().unwrap_or_default(),
        request.outcome.as_deref().unwrap_or_default(),
    ))
}

/// POST /api/verify/commitment
pub async fn verify_commitment_handler(
    Json(request): Json<CommitmentCheckRequest>,
) -> Json<Verification> {
    Json(verify::verify_commitment(
        request.server_seed.as_deref().unwrap_or_default(),
        request.server_seed_hash.as_deref().unwrap_or_default(),
    ))
}

/// GET /api/rooms
pub async fn rooms_handler(State(state): State<Arc<AppState>>) -> Json<RoomsResponse> {
    let active = state.processor.active_rooms().await;
    let finished = state
        .processor
        .finished_flips()
        .into_iter()
        .map(FlipResponse::from)
        .collect();

    Json(RoomsResponse { active, finished })
}

/// POST /api/rooms
pub async fn create_room_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<RoomResponse>, ApiError> {
    let side: CoinSide = request
        .side
        .parse()
        .map_err(|e: crate::errors::ValidationError| {
            ApiError::bad_request(request_id.0.clone(), e.to_string())
        })?;

    let ticket = state
        .processor
        .create_room(user.username(), request.bet, side)
        .await
        .map_err(|e| ApiError::from_error(request_id.0.clone(), e))?;

    Ok(Json(RoomResponse {
        room: ticket.room,
        balance: ticket.balance,
    }))
}

/// POST /api/rooms/:id/join
pub async fn join_room_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<u32>,
    user: AuthenticatedUser,
) -> Result<Json<JoinResponse>, ApiError> {
    let receipt = state
        .processor
        .join_room(room_id, user.username())
        .await
        .map_err(|e| ApiError::from_error(request_id.0.clone(), e))?;

    Ok(Json(JoinResponse {
        room: receipt.room,
        commitment: receipt.commitment,
        balance: receipt.balance,
    }))
}

/// DELETE /api/rooms/:id
pub async fn cancel_room_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<u32>,
    user: AuthenticatedUser,
) -> Result<Json<CancelResponse>, ApiError> {
    let balance = state
        .processor
        .cancel_room(room_id, user.username())
        .await
        .map_err(|e| ApiError::from_error(request_id.0.clone(), e))?;

    Ok(Json(CancelResponse { room_id, balance }))
}

/// POST /api/rooms/:id/seed
///
/// The body is optional; without a player seed the server draws one.
pub async fn submit_seed_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<u32>,
    user: AuthenticatedUser,
    body: Option<Json<SubmitSeedRequest>>,
) -> Result<Json<FlipResponse>, ApiError> {
    let player_seed = body.and_then(|Json(request)| request.player_seed);

    let record = state
        .processor
        .submit_player_seed(room_id, user.username(), player_seed)
        .await
        .map_err(|e| ApiError::from_error(request_id.0.clone(), e))?;

    if !state.reveal_delay.is_zero() {
        tokio::time::sleep(state.reveal_delay).await;
    }

    Ok(Json(FlipResponse::from_record(&record)))
}

/// GET /api/flips/:id
pub async fn flip_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<String>,
) -> Result<Json<FlipResponse>, ApiError> {
    state
        .processor
        .flip_record(&match_id)
        .map(|entry| Json(FlipResponse::from(entry)))
        .ok_or_else(|| {
            ApiError::not_found(request_id.0.clone(), format!("Flip {} not found", match_id))
        })
}

/// GET /api/account
pub async fn account_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Json<AccountResponse> {
    let account = state.processor.account(user.username());
    Json(AccountResponse {
        username: account.username,
        balance: account.balance,
        stats: account.stats,
    })
}
