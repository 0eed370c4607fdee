//! Application state for API handlers

use crate::claims::ClaimHandler;
use crate::context::PoolContext;
use crate::scheduler::{NotificationReconciler, Scheduler};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Ledger, registry, channel and event bus
    pub ctx: Arc<PoolContext>,

    /// Onboarding and reconciliation
    pub reconciler: Arc<NotificationReconciler>,

    /// Claim handling
    pub claims: Arc<ClaimHandler>,

    /// Scheduler handle
    pub scheduler: Arc<Scheduler>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        ctx: Arc<PoolContext>,
        reconciler: Arc<NotificationReconciler>,
        claims: Arc<ClaimHandler>,
        scheduler: Arc<Scheduler>,
    ) -> Self {
        Self {
            ctx,
            reconciler,
            claims,
            scheduler,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let duration = chrono::Utc::now() - self.started_at;
        let secs = duration.num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
