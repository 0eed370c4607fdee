//! Scheduler and reconciliation

mod reconciler;
mod runner;
mod ticks;

pub use reconciler::{NotificationReconciler, PassReport};
pub use runner::Scheduler;
pub use ticks::{IntervalTicks, ManualTicks, ManualTrigger, TickReason, TickSource};
