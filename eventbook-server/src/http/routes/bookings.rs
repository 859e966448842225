//! Booking submission action

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};

use crate::booking::SubmissionResult;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::NewBooking;

/// POST /api/bookings - persist one booking, answer `{ "success": bool }`
///
/// A well-formed request always gets 200; the flag says whether it was stored.
async fn create_booking(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewBooking>, JsonRejection>,
) -> Result<Json<SubmissionResult>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(state.writer.submit(&req).await))
}

/// Booking routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/bookings", post(create_booking))
}
