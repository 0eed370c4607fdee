//! Claim handlers

use super::persons::parse_person_id;
use crate::api::state::AppState;
use crate::claims::ClaimOutcome;
use crate::error::{ApiError, ApiResult};
use axum::{extract::State, http::StatusCode, Json};
use giftpool_types::GiftId;
use serde::Deserialize;

/// Claim request
#[derive(Debug, Deserialize)]
pub struct CreateClaimRequest {
    pub person: String,
    pub gift: String,
}

/// Claim one unit of a gift.
///
/// An exhausted gift answers `409 Conflict` with the `unavailable` outcome.
pub async fn create_claim(
    State(state): State<AppState>,
    Json(req): Json<CreateClaimRequest>,
) -> ApiResult<(StatusCode, Json<ClaimOutcome>)> {
    let person = parse_person_id(&req.person)?;
    let gift = GiftId::parse(req.gift)
        .map_err(|e| ApiError::BadRequest(format!("Invalid gift ID: {}", e)))?;

    let outcome = state.claims.claim(&person, &gift).await?;
    let status = match outcome {
        ClaimOutcome::Claimed { .. } => StatusCode::OK,
        ClaimOutcome::Unavailable => StatusCode::CONFLICT,
    };
    Ok((status, Json(outcome)))
}
