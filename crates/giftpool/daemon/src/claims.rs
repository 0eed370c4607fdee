//! Claim handling

use crate::context::PoolContext;
use crate::error::DaemonResult;
use crate::events::{EventSource, PoolEvent};
use giftpool_ledger::LedgerError;
use giftpool_notify::RegistryError;
use giftpool_types::{GiftId, NotificationKey, PersonId};
use serde::Serialize;
use std::sync::Arc;

/// Result of a claim request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClaimOutcome {
    /// The claim was recorded; `count` is the person's new total for the gift.
    Claimed { count: u32 },

    /// A capacity bound was already reached. Nothing was recorded.
    Unavailable,
}

/// Records claims and switches the claimed message to its final presentation.
pub struct ClaimHandler {
    ctx: Arc<PoolContext>,
}

impl ClaimHandler {
    pub fn new(ctx: Arc<PoolContext>) -> Self {
        Self { ctx }
    }

    /// Claim one unit of `gift` for `person`.
    ///
    /// A stale offer left behind by an exhausted gift is not touched here;
    /// the next reconciliation pass withdraws it.
    pub async fn claim(&self, person: &PersonId, gift: &GiftId) -> DaemonResult<ClaimOutcome> {
        let _guard = self.ctx.locks.lock(person).await;

        let count = match self.ctx.ledger.record(person, gift).await {
            Ok(count) => count,
            Err(err @ LedgerError::CapacityExceeded { .. }) => {
                self.ctx.events.emit(
                    PoolEvent::ClaimRejected {
                        person: person.clone(),
                        gift: gift.clone(),
                        reason: err.to_string(),
                    },
                    EventSource::Claims,
                );
                return Ok(ClaimOutcome::Unavailable);
            }
            Err(err) => return Err(err.into()),
        };

        self.ctx.events.emit(
            PoolEvent::ClaimRecorded {
                person: person.clone(),
                gift: gift.clone(),
                count,
            },
            EventSource::Claims,
        );

        let key = NotificationKey::new(person.clone(), gift.clone());
        match self.ctx.registry.mark_fulfilled(&key).await {
            Ok(handle) => {
                let presented = self
                    .ctx
                    .present_claimed(&key, &handle, EventSource::Claims)
                    .await;
                if let Err(err) = presented {
                    tracing::warn!(key = %key, error = %err, "Claimed presentation not applied");
                }
            }
            Err(RegistryError::NotFound(_)) => {
                tracing::debug!(key = %key, "Claim without a notification");
            }
            Err(err) => {
                // The claim stands; the next pass settles the handle.
                tracing::warn!(key = %key, error = %err, "Handle not marked fulfilled");
            }
        }

        Ok(ClaimOutcome::Claimed { count })
    }
}
