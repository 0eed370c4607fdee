//! Catalog handlers

use crate::api::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use giftpool_types::GiftId;
use serde::Serialize;

/// Gift with its current claim total
#[derive(Debug, Serialize)]
pub struct GiftStatus {
    pub id: GiftId,
    pub global_capacity: u32,
    pub per_person_capacity: u32,
    pub claimed: u32,
}

/// List catalog gifts in catalog order
pub async fn list_gifts(State(state): State<AppState>) -> Json<Vec<GiftStatus>> {
    let catalog = state.ctx.ledger.catalog().await;

    let mut gifts = Vec::with_capacity(catalog.len());
    for gift in catalog.list_gifts() {
        gifts.push(GiftStatus {
            id: gift.id.clone(),
            global_capacity: gift.global_capacity,
            per_person_capacity: gift.per_person_capacity,
            claimed: state.ctx.ledger.global_count(&gift.id).await,
        });
    }

    Json(gifts)
}

/// Catalog reload response
#[derive(Debug, Serialize)]
pub struct ReloadCatalogResponse {
    pub gifts: usize,
    pub rules: usize,
}

/// Re-read the catalog document and reconcile against it
pub async fn reload_catalog(
    State(state): State<AppState>,
) -> ApiResult<Json<ReloadCatalogResponse>> {
    let catalog = state.ctx.reload_catalog().await?;
    state.scheduler.trigger_reconcile();

    Ok(Json(ReloadCatalogResponse {
        gifts: catalog.len(),
        rules: catalog.list_rules().len(),
    }))
}
