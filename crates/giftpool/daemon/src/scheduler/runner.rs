//! Reconciliation loop

use super::reconciler::{NotificationReconciler, PassReport};
use super::ticks::{TickReason, TickSource};
use crate::config::SchedulerConfig;
use crate::events::{EventSource, PoolEvent};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

/// Scheduler state
pub struct Scheduler {
    config: SchedulerConfig,
    reconciler: Arc<NotificationReconciler>,
    reconcile_tx: mpsc::Sender<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl Scheduler {
    /// Create a new scheduler.
    ///
    /// The returned receiver carries [`Scheduler::trigger_reconcile`]
    /// requests and is meant for an [`IntervalTicks`](super::IntervalTicks).
    pub fn new(
        config: SchedulerConfig,
        reconciler: Arc<NotificationReconciler>,
    ) -> (Arc<Self>, mpsc::Receiver<()>) {
        let (reconcile_tx, reconcile_rx) = mpsc::channel(10);
        let (shutdown_tx, _) = watch::channel(false);

        let scheduler = Arc::new(Self {
            config,
            reconciler,
            reconcile_tx,
            shutdown_tx,
        });

        (scheduler, reconcile_rx)
    }

    pub fn reconciler(&self) -> &Arc<NotificationReconciler> {
        &self.reconciler
    }

    /// Trigger an immediate reconciliation
    pub fn trigger_reconcile(&self) {
        // A full queue already guarantees an upcoming pass.
        let _ = self.reconcile_tx.try_send(());
    }

    /// Run passes until the tick source ends or [`Scheduler::stop`] is called.
    pub async fn run<T: TickSource>(self: Arc<Self>, mut ticks: T) {
        let mut shutdown = self.shutdown_tx.subscribe();
        if *shutdown.borrow_and_update() {
            return;
        }

        tracing::info!(
            interval_secs = self.config.reconcile_interval_secs,
            pass_timeout_secs = self.config.pass_timeout_secs,
            "Scheduler started"
        );

        loop {
            let reason = tokio::select! {
                reason = ticks.next_tick() => reason,
                _ = shutdown.changed() => None,
            };
            let Some(reason) = reason else { break };

            self.tick(reason).await;

            if *shutdown.borrow() {
                break;
            }
        }

        tracing::info!("Scheduler stopped");
    }

    /// Run one pass bounded by the configured timeout.
    pub async fn tick(&self, reason: TickReason) -> Option<PassReport> {
        tracing::trace!(?reason, "Reconciliation tick");

        match timeout(self.config.pass_timeout(), self.reconciler.run_pass()).await {
            Ok(report) => Some(report),
            Err(_) => {
                tracing::error!(
                    timeout_secs = self.config.pass_timeout_secs,
                    "Reconciliation pass timed out"
                );
                self.reconciler
                    .context()
                    .events
                    .emit(PoolEvent::PassTimedOut, EventSource::Reconciler);
                None
            }
        }
    }

    /// Stop the scheduler
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }
}
