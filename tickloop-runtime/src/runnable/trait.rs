use crate::scheduler::TaskContext;

/// Unit of work run by the scheduler.
///
/// `run` executes synchronously on the scheduler's thread and must return
/// promptly. Long waits are expressed with [`TaskContext::wait`], which
/// suspends the task and returns control to the scheduler.
///
/// Closures implement this trait directly, so bound context travels with
/// the callback:
///
/// ```rust
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
/// use tickloop_runtime::{Scheduler, TaskContext};
///
/// let hits = Arc::new(AtomicU32::new(0));
/// let counter = hits.clone();
/// let mut scheduler = Scheduler::default();
/// scheduler
///     .add(move |_: &mut TaskContext<'_>| {
///         counter.fetch_add(1, Ordering::Relaxed);
///     }, 10, "Counter")
///     .unwrap();
/// ```
pub trait Runnable: Send {
    /// Execute one invocation of the task
    fn run(&mut self, ctx: &mut TaskContext<'_>);
}

impl<F> Runnable for F
where
    F: FnMut(&mut TaskContext<'_>) + Send,
{
    fn run(&mut self, ctx: &mut TaskContext<'_>) {
        self(ctx)
    }
}
