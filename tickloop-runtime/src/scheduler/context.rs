use super::scheduler::Scheduler;
use crate::clock::{clamp_interval, deadline_reached};
use crate::coroutine::{CoroutineContext, ResumePoint, Wait};
use crate::error::Error;
use crate::task::TaskId;
use tracing::{trace, warn};

/// What a callback sees of the scheduler while it runs.
///
/// Carries the id of the running task and mutable access to the scheduler,
/// so a callback can add, suspend or remove tasks (itself included) and
/// park at coroutine suspension points.
pub struct TaskContext<'a> {
    scheduler: &'a mut Scheduler,
    id: TaskId,
}

impl<'a> TaskContext<'a> {
    pub(crate) fn new(scheduler: &'a mut Scheduler, id: TaskId) -> Self {
        Self { scheduler, id }
    }

    /// Id of the running task.
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn now(&self) -> u32 {
        self.scheduler.now()
    }

    pub fn scheduler(&mut self) -> &mut Scheduler {
        self.scheduler
    }

    /// Saved coroutine state of the running task.
    pub fn coroutine(&self) -> CoroutineContext {
        self.scheduler.coroutines[self.id.index()]
    }

    /// Point the task is parked at, `None` on a fresh entry.
    ///
    /// Raw values `P` does not recognise also yield `None`.
    pub fn resume_point<P: ResumePoint>(&self) -> Option<P> {
        match self.coroutine().resume_point() {
            0 => None,
            raw => P::from_raw(raw),
        }
    }

    /// Reach suspension point `point` and wait `delay_ms` there.
    ///
    /// On first arrival the point and its deadline are saved and the task is
    /// delayed; the callback must return on [`Wait::Pending`]. When the
    /// callback is entered again and reaches the same point, the call returns
    /// [`Wait::Elapsed`] once the deadline has passed (clearing the saved
    /// point) or parks again for the remaining time.
    ///
    /// If no slot is free for the wake-up task the task stays scheduled and
    /// polls the deadline on its next regular run.
    pub fn wait<P: ResumePoint>(&mut self, point: P, delay_ms: u32) -> Wait {
        let raw = point.to_raw();
        if raw == 0 {
            warn!(id = %self.id, "Resume point 0 is reserved, not waiting");
            return Wait::Elapsed;
        }
        let Some(index) = self.scheduler.live_index(self.id) else {
            return Wait::Pending;
        };

        let now = self.scheduler.now();
        let saved = self.scheduler.coroutines[index];
        if saved.resume_point != raw {
            let context = &mut self.scheduler.coroutines[index];
            context.resume_point = raw;
            context.deadline = now.wrapping_add(clamp_interval(delay_ms));
            trace!(id = %self.id, point = raw, deadline = context.deadline, "Task parked");
            self.park(delay_ms);
            return Wait::Pending;
        }

        if deadline_reached(now, saved.deadline) {
            self.scheduler.coroutines[index].resume_point = 0;
            trace!(id = %self.id, point = raw, "Wait elapsed");
            return Wait::Elapsed;
        }

        if self.scheduler.has_pending_wake(self.id) {
            // resumed early; the existing waker still fires at the deadline
            self.scheduler.suspend(self.id);
        } else {
            self.park(saved.deadline.wrapping_sub(now));
        }
        Wait::Pending
    }

    /// Mark the end of the coroutine body; the next entry starts fresh.
    pub fn finish(&mut self) {
        if let Some(index) = self.scheduler.live_index(self.id) {
            self.scheduler.coroutines[index].reset();
        }
    }

    /// Suspend the running task. It is not re-queued after this run.
    pub fn suspend(&mut self) {
        self.scheduler.suspend(self.id);
    }

    /// Suspend the running task and wake it after `delay_ms`.
    pub fn delay(&mut self, delay_ms: u32) -> Result<TaskId, Error> {
        self.scheduler.delay(self.id, delay_ms)
    }

    /// Remove the running task. The callback finishes this run normally.
    pub fn remove(&mut self) {
        self.scheduler.remove(self.id);
    }

    pub fn change_interval(&mut self, new_interval: i64) {
        self.scheduler.change_interval(self.id, new_interval);
    }

    fn park(&mut self, delay_ms: u32) {
        if let Err(e) = self.scheduler.delay(self.id, delay_ms) {
            warn!(id = %self.id, error = %e, "Cannot park task, polling on its next run");
        }
    }
}
