//! Server setup and lifecycle management

use crate::api::{create_router, AppState};
use crate::claims::ClaimHandler;
use crate::config::{DaemonConfig, StorageConfig, TransportConfig};
use crate::context::PoolContext;
use crate::error::{DaemonError, DaemonResult};
use crate::scheduler::{IntervalTicks, NotificationReconciler, Scheduler};
use crate::transport::{TelegramChannel, TelegramClient, TelegramPoller};
use giftpool_notify::{FsContentProvider, InMemoryChannel, NotificationChannel};
use giftpool_state::{InMemoryStateStore, JsonFileStateStore, StateStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};

/// Giftpool daemon server
pub struct Server {
    config: DaemonConfig,
    ctx: Arc<PoolContext>,
    reconciler: Arc<NotificationReconciler>,
    claims: Arc<ClaimHandler>,
    scheduler: Arc<Scheduler>,
    reconcile_rx: mpsc::Receiver<()>,
    telegram: Option<Arc<TelegramClient>>,
}

impl Server {
    /// Create a new server with the given configuration
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        // Create storage
        let store: Arc<dyn StateStore> = match &config.storage {
            StorageConfig::Memory => {
                tracing::warn!("Using in-memory storage; state is lost on exit");
                Arc::new(InMemoryStateStore::new())
            }
            StorageConfig::Json { dir } => {
                tracing::info!(dir = %dir.display(), "Using JSON file storage");
                Arc::new(JsonFileStateStore::open(dir.clone()).await?)
            }
        };

        // Create transport
        let mut telegram = None;
        let channel: Arc<dyn NotificationChannel> = match &config.transport {
            TransportConfig::Memory => Arc::new(InMemoryChannel::new()),
            TransportConfig::Telegram(settings) => {
                // Leave headroom above the long-poll timeout.
                let request_timeout = Duration::from_secs(settings.poll_timeout_secs + 10);
                let client =
                    TelegramClient::new(&settings.api_base, &settings.token, request_timeout)
                        .map_err(|e| DaemonError::Config(format!("Telegram client: {}", e)))?;
                let client = Arc::new(client);
                telegram = Some(Arc::clone(&client));
                Arc::new(TelegramChannel::new(client, settings.claim_label.clone()))
            }
        };

        let content = Arc::new(FsContentProvider::new(config.content.root.clone()));

        let ctx = Arc::new(PoolContext::load(store, channel, content).await?);
        let reconciler = Arc::new(NotificationReconciler::new(Arc::clone(&ctx)));
        let claims = Arc::new(ClaimHandler::new(Arc::clone(&ctx)));
        let (scheduler, reconcile_rx) =
            Scheduler::new(config.scheduler.clone(), Arc::clone(&reconciler));

        Ok(Self {
            config,
            ctx,
            reconciler,
            claims,
            scheduler,
            reconcile_rx,
            telegram,
        })
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        // Create app state
        let state = AppState::new(
            Arc::clone(&self.ctx),
            Arc::clone(&self.reconciler),
            Arc::clone(&self.claims),
            Arc::clone(&self.scheduler),
        );

        // Create router
        let app = create_router(state, self.config.server.enable_cors);

        // Create listener
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Giftpool daemon listening on {}", addr);

        // Start scheduler in background
        let ticks = IntervalTicks::new(
            self.config.scheduler.reconcile_interval(),
            self.reconcile_rx,
        );
        let scheduler = tokio::spawn(Arc::clone(&self.scheduler).run(ticks));

        // Start Telegram poller
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poller = match (&self.config.transport, self.telegram) {
            (TransportConfig::Telegram(telegram), Some(client)) => {
                let poller = TelegramPoller::new(
                    client,
                    telegram.clone(),
                    Arc::clone(&self.reconciler),
                    Arc::clone(&self.claims),
                );
                Some(tokio::spawn(poller.run(shutdown_rx)))
            }
            _ => None,
        };

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Giftpool daemon shutting down");

        // Stop background tasks
        self.scheduler.stop();
        shutdown_tx.send_replace(true);

        if let Err(e) = scheduler.await {
            tracing::error!(error = %e, "Scheduler task failed");
        }
        if let Some(poller) = poller {
            if let Err(e) = poller.await {
                tracing::error!(error = %e, "Telegram poller task failed");
            }
        }

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
