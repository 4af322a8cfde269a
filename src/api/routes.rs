//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Public verification
        .route("/api/verify", post(verify_handler))
        .route("/api/verify/commitment", post(verify_commitment_handler))
        // Rooms
        .route("/api/rooms", get(rooms_handler).post(create_room_handler))
        .route("/api/rooms/:id", axum::routing::delete(cancel_room_handler))
        .route("/api/rooms/:id/join", post(join_room_handler))
        .route("/api/rooms/:id/seed", post(submit_seed_handler))
        // Finished flips and accounts
        .route("/api/flips/:id", get(flip_handler))
        .route("/api/account", get(account_handler))
        .with_state(state)
}
