use super::scheduler::Scheduler;
use crate::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Handle for a running scheduler
/// Used to stop the host driver and get the scheduler back
pub struct SchedulerHandle {
    tick_task: JoinHandle<()>,
    run_task: JoinHandle<Scheduler>,
    shutdown: watch::Sender<bool>,
}

impl SchedulerHandle {
    pub(crate) fn spawn(mut scheduler: Scheduler, tick_period: Duration) -> Self {
        let (shutdown, mut stop) = watch::channel(false);
        let wake = Arc::new(Notify::new());
        let clock = scheduler.clock().clone();
        let ms_per_tick = u32::try_from(tick_period.as_millis().max(1)).unwrap_or(u32::MAX);

        info!(
            tasks = scheduler.active_tasks(),
            tick_period_ms = ms_per_tick,
            "Starting scheduler"
        );

        // Stands in for the 1 ms timer interrupt. Stops once the handle is
        // shut down or dropped.
        let tick_wake = wake.clone();
        let mut tick_stop = stop.clone();
        let tick_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_period.max(Duration::from_millis(1)));
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            interval.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = tick_stop.changed() => break,
                    _ = interval.tick() => {
                        clock.advance(ms_per_tick);
                        tick_wake.notify_one();
                    }
                }
            }
        });

        let run_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = wake.notified() => {
                        let executed = scheduler.run_pending();
                        if executed > 0 {
                            debug!(executed, now = scheduler.now(), "Scheduler pass");
                        }
                    }
                }
            }
            scheduler
        });

        Self {
            tick_task,
            run_task,
            shutdown,
        }
    }

    /// Stop the tick source and the run loop, returning the scheduler with
    /// all of its tasks and telemetry intact.
    pub async fn shutdown(self) -> Result<Scheduler, Error> {
        self.tick_task.abort();
        // the run loop may already be gone if a callback panicked
        let _ = self.shutdown.send(true);
        let scheduler = self
            .run_task
            .await
            .map_err(|e| Error::Runtime(format!("scheduler run loop failed: {}", e)))?;
        info!(now = scheduler.now(), "Scheduler stopped");
        Ok(scheduler)
    }
}
