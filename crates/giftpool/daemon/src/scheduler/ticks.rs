//! Tick sources driving the scheduler

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Why a pass was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickReason {
    Interval,
    Triggered,
    Manual,
}

/// Source of reconciliation ticks.
#[async_trait]
pub trait TickSource: Send {
    /// Wait for the next tick. `None` ends the scheduler loop.
    async fn next_tick(&mut self) -> Option<TickReason>;
}

/// Fixed-interval ticks plus on-demand triggers.
pub struct IntervalTicks {
    interval: Interval,
    triggers: Option<mpsc::Receiver<()>>,
}

impl IntervalTicks {
    pub fn new(period: Duration, triggers: mpsc::Receiver<()>) -> Self {
        let mut interval = interval(period);
        // A slow pass must not be followed by a burst of catch-up passes.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            triggers: Some(triggers),
        }
    }
}

#[async_trait]
impl TickSource for IntervalTicks {
    async fn next_tick(&mut self) -> Option<TickReason> {
        if let Some(triggers) = self.triggers.as_mut() {
            tokio::select! {
                _ = self.interval.tick() => return Some(TickReason::Interval),
                trigger = triggers.recv() => {
                    if trigger.is_some() {
                        return Some(TickReason::Triggered);
                    }
                }
            }
            // All trigger senders are gone; keep ticking on the interval.
            self.triggers = None;
        }

        self.interval.tick().await;
        Some(TickReason::Interval)
    }
}

/// Ticks that only arrive when a [`ManualTrigger`] fires.
pub struct ManualTicks {
    rx: mpsc::Receiver<()>,
}

/// Sending half of [`ManualTicks`].
#[derive(Clone)]
pub struct ManualTrigger {
    tx: mpsc::Sender<()>,
}

impl ManualTicks {
    pub fn channel() -> (ManualTrigger, ManualTicks) {
        let (tx, rx) = mpsc::channel(16);
        (ManualTrigger { tx }, ManualTicks { rx })
    }
}

impl ManualTrigger {
    /// Request one pass. Returns `false` once the scheduler is gone.
    pub async fn tick(&self) -> bool {
        self.tx.send(()).await.is_ok()
    }
}

#[async_trait]
impl TickSource for ManualTicks {
    async fn next_tick(&mut self) -> Option<TickReason> {
        self.rx.recv().await.map(|()| TickReason::Manual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_interval_ticks_and_triggers() {
        let (tx, rx) = mpsc::channel(4);
        let mut ticks = IntervalTicks::new(Duration::from_secs(2), rx);

        // The first interval tick completes immediately.
        assert_eq!(ticks.next_tick().await, Some(TickReason::Interval));

        tx.send(()).await.unwrap();
        assert_eq!(ticks.next_tick().await, Some(TickReason::Triggered));

        drop(tx);
        assert_eq!(ticks.next_tick().await, Some(TickReason::Interval));
    }

    #[tokio::test]
    async fn test_manual_ticks_end_with_trigger() {
        let (trigger, mut ticks) = ManualTicks::channel();

        assert!(trigger.tick().await);
        assert_eq!(ticks.next_tick().await, Some(TickReason::Manual));

        drop(trigger);
        assert_eq!(ticks.next_tick().await, None);
    }
}
