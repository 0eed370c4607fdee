//! Person handlers

use crate::api::state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::scheduler::PassReport;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use giftpool_types::{Gift, Person, PersonId};
use serde::{Deserialize, Serialize};

/// Onboarding request
#[derive(Debug, Deserialize)]
pub struct OnboardPersonRequest {
    pub id: String,
    pub display_name: String,
}

/// Onboarding response
#[derive(Debug, Serialize)]
pub struct OnboardPersonResponse {
    pub person: Person,
    pub report: PassReport,
}

/// List all persons
pub async fn list_persons(State(state): State<AppState>) -> Json<Vec<Person>> {
    Json(state.ctx.ledger.persons().await)
}

/// Register a person and send their current offers
pub async fn onboard_person(
    State(state): State<AppState>,
    Json(req): Json<OnboardPersonRequest>,
) -> ApiResult<(StatusCode, Json<OnboardPersonResponse>)> {
    let id = parse_person_id(&req.id)?;
    let report = state.reconciler.onboard(id.clone(), &req.display_name).await?;

    let person = state
        .ctx
        .ledger
        .person(&id)
        .await
        .ok_or_else(|| ApiError::Internal(format!("Person {} vanished", id)))?;

    Ok((
        StatusCode::CREATED,
        Json(OnboardPersonResponse { person, report }),
    ))
}

/// Get a specific person
pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Person>> {
    let id = parse_person_id(&id)?;
    let person = state
        .ctx
        .ledger
        .person(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Person {} not found", id)))?;
    Ok(Json(person))
}

/// Gifts currently offered to a person
pub async fn list_offers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Gift>>> {
    let id = parse_person_id(&id)?;
    let person = state
        .ctx
        .ledger
        .person(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Person {} not found", id)))?;

    let offers = state
        .ctx
        .resolver
        .offers_for(&person.id, &person.display_name)
        .await;
    Ok(Json(offers))
}

pub(super) fn parse_person_id(id: &str) -> ApiResult<PersonId> {
    PersonId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid person ID: {}", e)))
}
