//! Fixed-period repeating tasks
//!
//! The first tick fires one period after start and every tick runs as its
//! own task, so slow ticks overlap instead of delaying the schedule.

use log::{trace, warn};
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

pub struct PollingScheduler;

impl PollingScheduler {
    /// Start calling `callback` every `period` until the returned handle is stopped
    ///
    /// Errors returned by a tick are logged and never cancel the schedule.
    pub fn start<F, Fut>(name: &'static str, period: Duration, mut callback: F) -> PollHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let flag = active.clone();
        let first_tick = Instant::now() + period;

        let task = tokio::spawn(async move {
            let mut ticks = interval_at(first_tick, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;
                if !flag.load(Ordering::Acquire) {
                    break;
                }

                trace!("{name} tick");
                let tick = callback();
                tokio::spawn(async move {
                    if let Err(e) = tick.await {
                        warn!("{name} tick failed: {e:#}");
                    }
                });
            }
        });

        PollHandle {
            name,
            period,
            active,
            task,
        }
    }
}

/// Handle of a running schedule, owned by whoever started it
///
/// Dropping the handle stops the schedule.
#[derive(Debug)]
pub struct PollHandle {
    name: &'static str,
    period: Duration,
    active: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop the schedule; no callback is invoked afterwards
    ///
    /// Ticks already running are not aborted. Calling `stop` again is a no-op.
    pub fn stop(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            trace!("{} stopped", self.name);
            self.task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
