//! Reconciliation trigger and event streaming

use crate::api::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream};
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Reconcile trigger response
#[derive(Debug, Serialize)]
pub struct TriggerReconcileResponse {
    pub triggered: bool,
}

/// Request an immediate reconciliation pass
pub async fn trigger_reconcile(
    State(state): State<AppState>,
) -> (StatusCode, Json<TriggerReconcileResponse>) {
    state.scheduler.trigger_reconcile();
    (
        StatusCode::ACCEPTED,
        Json(TriggerReconcileResponse { triggered: true }),
    )
}

/// Stream events via SSE
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.ctx.events.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Ok(event) => {
                let json = serde_json::to_string(&event).unwrap_or_default();
                let sse_event = Event::default().data(json);
                Some((Ok(sse_event), rx))
            }
            Err(RecvError::Lagged(_)) => {
                // Client lagged behind, continue
                Some((Ok(Event::default().comment("lagged")), rx))
            }
            Err(RecvError::Closed) => None,
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
