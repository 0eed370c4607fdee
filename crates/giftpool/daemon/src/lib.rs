//! Giftpool daemon library
//!
//! This module provides the core components for the giftpool daemon:
//! - Notification reconciliation and its scheduler
//! - Onboarding and claim handling
//! - REST API handlers
//! - Telegram transport
//! - Server lifecycle management

pub mod api;
pub mod claims;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod server;
pub mod transport;

pub use claims::{ClaimHandler, ClaimOutcome};
pub use config::DaemonConfig;
pub use context::{PersonLocks, PoolContext};
pub use error::{ApiError, DaemonError, DaemonResult};
pub use events::{EventBus, EventSource, PoolEvent, PoolEventEnvelope};
pub use scheduler::{
    IntervalTicks, ManualTicks, ManualTrigger, NotificationReconciler, PassReport, Scheduler,
    TickSource,
};
pub use server::Server;
