use super::context::TaskContext;
use super::handle::SchedulerHandle;
use crate::clock::{clamp_interval, elapsed, Clock};
use crate::config::SchedulerConfig;
use crate::coroutine::CoroutineContext;
use crate::cpu_util::CpuUtil;
use crate::error::Error;
use crate::ready_list::{NodeIndex, NodeLocation, ReadyList};
use crate::runnable::Runnable;
use crate::task::{TaskId, TaskInfo, TaskSlot, TaskState};
use std::borrow::Cow;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Returned by [`Scheduler::actual_run_interval`] for unknown handles.
pub const INVALID_RUN_INTERVAL: u32 = u32::MAX;

/// Cooperative, fixed-capacity task scheduler.
///
/// Tasks run in order of their next run time. Each call to
/// [`run_pending`](Scheduler::run_pending) executes every task whose
/// deadline has passed, one after the other, on the caller's thread.
/// Periodic tasks are re-queued `interval` milliseconds after they finish;
/// one-shot tasks retire after their run.
///
/// All tables are sized once from [`SchedulerConfig::capacity`] and never
/// grow.
pub struct Scheduler {
    pub(crate) clock: Clock,
    pub(crate) config: SchedulerConfig,
    pub(crate) tasks: Vec<TaskSlot>,
    pub(crate) ready: ReadyList,
    pub(crate) coroutines: Vec<CoroutineContext>,
    /// Auxiliary delay task index -> task it wakes.
    pub(crate) delayed: Vec<Option<TaskId>>,
    pub(crate) cpu: CpuUtil,
    deferred: Vec<NodeIndex>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::build(SchedulerConfig::default(), Clock::new())
    }
}

impl Scheduler {
    /// Create a scheduler with its own clock.
    pub fn new(config: SchedulerConfig) -> Result<Self, Error> {
        Self::with_clock(config, Clock::new())
    }

    /// Create a scheduler reading time from a shared clock.
    pub fn with_clock(config: SchedulerConfig, clock: Clock) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::build(config, clock))
    }

    fn build(config: SchedulerConfig, clock: Clock) -> Self {
        let capacity = config.capacity;
        let now = clock.now();
        Self {
            tasks: (0..capacity).map(|_| TaskSlot::empty()).collect(),
            ready: ReadyList::new(capacity),
            coroutines: vec![CoroutineContext::default(); capacity],
            delayed: vec![None; capacity],
            cpu: CpuUtil::new(capacity, config.cpu_min_window_ms, now),
            deferred: Vec::with_capacity(capacity),
            clock,
            config,
        }
    }

    /// Drop every task and return all nodes to the pool.
    pub fn init(&mut self) {
        for slot in &mut self.tasks {
            slot.release();
        }
        self.ready.reset();
        self.coroutines.fill(CoroutineContext::default());
        self.delayed.fill(None);
        self.deferred.clear();
        self.cpu.init(self.clock.now());
        debug!(capacity = self.capacity(), "Scheduler initialized");
    }

    /// Add a periodic task first due `interval_ms` from now.
    ///
    /// An interval of 0 makes a one-shot task that runs on the next pass.
    pub fn add<R>(
        &mut self,
        callback: R,
        interval_ms: u32,
        name: impl Into<Cow<'static, str>>,
    ) -> Result<TaskId, Error>
    where
        R: Runnable + 'static,
    {
        let interval_ms = clamp_interval(interval_ms);
        self.insert_task(Box::new(callback), interval_ms, interval_ms, name.into())
    }

    /// Add a task that runs once, `delay_ms` from now, then retires.
    pub fn add_one_shot<R>(
        &mut self,
        callback: R,
        delay_ms: u32,
        name: impl Into<Cow<'static, str>>,
    ) -> Result<TaskId, Error>
    where
        R: Runnable + 'static,
    {
        self.insert_task(Box::new(callback), 0, clamp_interval(delay_ms), name.into())
    }

    pub(crate) fn insert_task(
        &mut self,
        callback: Box<dyn Runnable>,
        interval_ms: u32,
        first_delay_ms: u32,
        name: Cow<'static, str>,
    ) -> Result<TaskId, Error> {
        let Some(index) = self.tasks.iter().position(|slot| !slot.active) else {
            warn!(task = %name, capacity = self.capacity(), "No free task slot");
            return Err(Error::ResourceExhausted);
        };
        let Some(node) = self.ready.alloc(index) else {
            warn!(task = %name, "Schedule node pool exhausted");
            return Err(Error::ResourceExhausted);
        };

        let now = self.clock.now();
        let slot = &mut self.tasks[index];
        let generation = slot.generation.wrapping_add(1);
        *slot = TaskSlot {
            callback: Some(callback),
            interval_ms,
            last_run: now,
            max_exec_time: 0,
            actual_exec_time: 0,
            state: TaskState::Ready,
            active: true,
            name,
            generation,
            node: Some(node),
        };
        self.coroutines[index].reset();
        self.ready.insert(node, now.wrapping_add(first_delay_ms));

        let id = TaskId::new(index, generation);
        debug!(
            task = %self.tasks[index].name,
            id = %id,
            interval_ms,
            first_run = now.wrapping_add(first_delay_ms),
            "Task added"
        );
        Ok(id)
    }

    /// Remove a task and free its node. Unknown or inactive ids are ignored.
    pub fn remove(&mut self, id: TaskId) {
        let Some(index) = self.live_index(id) else {
            return;
        };

        if let Some(node) = self.tasks[index].node {
            self.ready.free(node);
        }
        debug!(task = %self.tasks[index].name, id = %id, "Task removed");

        self.tasks[index].release();
        self.coroutines[index].reset();
        self.delayed[index] = None;
        for pending in &mut self.delayed {
            if *pending == Some(id) {
                *pending = None;
            }
        }
    }

    /// Take a task out of scheduling. It keeps its node for [`resume`].
    ///
    /// [`resume`]: Scheduler::resume
    pub fn suspend(&mut self, id: TaskId) {
        let Some(index) = self.live_index(id) else {
            return;
        };
        let slot = &mut self.tasks[index];
        slot.state = TaskState::Suspended;
        if let Some(node) = slot.node {
            self.ready.detach(node);
        }
        debug!(task = %self.tasks[index].name, id = %id, "Task suspended");
    }

    /// Put a task back into scheduling.
    ///
    /// A task parked inside a coroutine wait is due immediately; any other
    /// task is due one interval from now.
    pub fn resume(&mut self, id: TaskId) {
        let Some(index) = self.live_index(id) else {
            return;
        };
        let Some(node) = self.tasks[index].node else {
            return;
        };

        let now = self.clock.now();
        let slot = &mut self.tasks[index];
        slot.state = TaskState::Ready;
        let next_run = if self.coroutines[index].is_suspended() {
            now
        } else {
            now.wrapping_add(slot.interval_ms)
        };
        self.ready.insert(node, next_run);
        debug!(task = %self.tasks[index].name, id = %id, next_run, "Task resumed");
    }

    /// Change a task's interval and reschedule it from now.
    ///
    /// Values `<= 0` become 1 ms: interval 0 is reserved for one-shot tasks.
    pub fn change_interval(&mut self, id: TaskId, new_interval: i64) {
        let Some(index) = self.live_index(id) else {
            return;
        };
        let interval = clamp_interval(new_interval.clamp(1, i64::from(u32::MAX)) as u32);
        self.tasks[index].interval_ms = interval;
        debug!(task = %self.tasks[index].name, id = %id, interval, "Task interval changed");

        if self.tasks[index].node.is_some() {
            self.resume(id);
        }
    }

    /// Suspend a task and wake it again after `delay_ms`.
    ///
    /// The wake-up is an auxiliary one-shot task, whose id is returned. If
    /// no slot is free for it the task is left running and
    /// [`Error::ResourceExhausted`] is returned. Unknown ids are ignored and
    /// yield [`TaskId::INVALID`].
    pub fn delay(&mut self, id: TaskId, delay_ms: u32) -> Result<TaskId, Error> {
        let Some(index) = self.live_index(id) else {
            return Ok(TaskId::INVALID);
        };

        let name = format!("DelayResume_{}", index);
        let waker = self.insert_task(
            Box::new(DelayedResume),
            0,
            clamp_interval(delay_ms),
            Cow::Owned(name),
        )?;
        self.suspend(id);
        self.delayed[waker.index()] = Some(id);
        debug!(id = %id, waker = %waker, delay_ms, "Task delayed");
        Ok(waker)
    }

    /// Whether a wake-up task from [`delay`](Scheduler::delay) is still
    /// pending for `id`.
    pub fn has_pending_wake(&self, id: TaskId) -> bool {
        id.is_valid() && self.delayed.contains(&Some(id))
    }

    /// Run every task whose deadline has passed. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut executed = 0;

        while let Some(node) = self.ready.pop_due(self.clock.now()) {
            let index = self.ready.task_of(node);
            let owner = self
                .tasks
                .get(index)
                .filter(|slot| slot.active && slot.node == Some(node))
                .map(|slot| (slot.state, slot.generation));

            match owner {
                None => {
                    trace!(node, task = index, "Freeing orphaned schedule node");
                    self.ready.free(node);
                }
                Some((TaskState::Ready, generation)) => {
                    self.execute(TaskId::new(index, generation), node);
                    executed += 1;
                }
                Some(_) => self.deferred.push(node),
            }
        }

        for node in self.deferred.drain(..) {
            let next_run = self.ready.next_run_time(node);
            self.ready.insert(node, next_run);
        }

        executed
    }

    fn execute(&mut self, id: TaskId, node: NodeIndex) {
        let index = id.index();
        self.tasks[index].state = TaskState::Running;
        let start = self.clock.now();

        if let Some(mut callback) = self.tasks[index].callback.take() {
            callback.run(&mut TaskContext::new(self, id));
            let slot = &mut self.tasks[index];
            if slot.active && slot.generation == id.generation() && slot.callback.is_none() {
                slot.callback = Some(callback);
            }
        }

        let end = self.clock.now();
        let exec_time = elapsed(end, start);
        self.cpu.update_task_run_time(index, exec_time);

        let slot = &mut self.tasks[index];
        if slot.generation != id.generation() {
            // removed during its own run; remove() already freed the node
            return;
        }
        slot.actual_exec_time = exec_time;
        slot.max_exec_time = slot.max_exec_time.max(exec_time);
        slot.last_run = end;
        trace!(task = %slot.name, id = %id, exec_time, "Task executed");

        if !slot.active || slot.node != Some(node) || slot.state == TaskState::Suspended {
            return;
        }

        slot.state = TaskState::Ready;
        if slot.interval_ms == 0 {
            self.retire(index);
        } else {
            let next_run = end.wrapping_add(slot.interval_ms);
            self.ready.insert(node, next_run);
        }
    }

    /// Finish a one-shot task: free its node and deactivate the slot.
    ///
    /// The handle keeps reporting telemetry until the slot is reused.
    fn retire(&mut self, index: usize) {
        let slot = &mut self.tasks[index];
        if let Some(node) = slot.node.take() {
            self.ready.free(node);
        }
        slot.active = false;
        slot.callback = None;
        self.coroutines[index].reset();
        debug!(task = %self.tasks[index].name, "One-shot task retired");
    }

    /// Advance the clock by one millisecond (the tick interrupt's job).
    pub fn update_tick(&self) {
        self.clock.update_tick();
    }

    /// Current system time in milliseconds.
    pub fn now(&self) -> u32 {
        self.clock.now()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.tasks.len()
    }

    /// Execution time of the task's last run, or [`INVALID_RUN_INTERVAL`].
    ///
    /// A retired one-shot task still reports until its slot is reused.
    pub fn actual_run_interval(&self, id: TaskId) -> u32 {
        match self.slot(id) {
            Some(slot) => slot.actual_exec_time,
            None => INVALID_RUN_INTERVAL,
        }
    }

    /// Snapshot of a task's metadata, including retired one-shot tasks.
    pub fn task(&self, id: TaskId) -> Option<TaskInfo> {
        self.slot(id).map(TaskSlot::info)
    }

    pub fn is_active(&self, id: TaskId) -> bool {
        self.live_index(id).is_some()
    }

    pub fn active_tasks(&self) -> usize {
        self.tasks.iter().filter(|slot| slot.active).count()
    }

    /// When the task is next due, if it is in the ready list.
    pub fn next_run_time(&self, id: TaskId) -> Option<u32> {
        let node = self.tasks[self.live_index(id)?].node?;
        (self.ready.location(node)? == NodeLocation::Ready).then(|| self.ready.next_run_time(node))
    }

    /// Where the task's schedule node currently lives.
    pub fn node_location(&self, id: TaskId) -> Option<NodeLocation> {
        let node = self.tasks[self.live_index(id)?].node?;
        self.ready.location(node)
    }

    /// Tasks in the order they will fire, with their run times.
    pub fn ready_queue(&self) -> Vec<(TaskId, u32)> {
        self.ready
            .iter()
            .map(|(index, time)| {
                let generation = self.tasks.get(index).map_or(0, |slot| slot.generation);
                (TaskId::new(index, generation), time)
            })
            .collect()
    }

    pub fn free_nodes(&self) -> usize {
        self.ready.free_count()
    }

    /// Saved coroutine state of a live task.
    pub fn coroutine(&self, id: TaskId) -> Option<CoroutineContext> {
        self.live_index(id).map(|index| self.coroutines[index])
    }

    pub fn cpu(&self) -> &CpuUtil {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CpuUtil {
        &mut self.cpu
    }

    /// Close the current CPU sampling window at the current time.
    pub fn calculate_cpu_usage(&mut self) -> f32 {
        self.cpu.calculate(self.clock.now())
    }

    /// CPU usage of a task over the last window, 0 for unknown handles.
    pub fn task_usage(&self, id: TaskId) -> f32 {
        match self.slot(id) {
            Some(_) => self.cpu.task_usage(id.index()),
            None => 0.0,
        }
    }

    pub fn total_usage(&self) -> f32 {
        self.cpu.total_usage()
    }

    /// Add a periodic task recomputing CPU usage every
    /// `cpu_sample_interval_ms`.
    pub fn add_cpu_monitor(&mut self) -> Result<TaskId, Error> {
        let interval = self.config.cpu_sample_interval_ms;
        self.add(
            |ctx: &mut TaskContext<'_>| {
                ctx.scheduler().calculate_cpu_usage();
            },
            interval,
            "CpuMonitor",
        )
    }

    /// Drive the scheduler from tokio: a tick source advances the clock every
    /// `tick_period` and wakes a run loop that calls
    /// [`run_pending`](Scheduler::run_pending).
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self, tick_period: Duration) -> SchedulerHandle {
        SchedulerHandle::spawn(self, tick_period)
    }

    /// Slot for `id` if the handle is current, active or retired.
    fn slot(&self, id: TaskId) -> Option<&TaskSlot> {
        self.tasks
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
    }

    /// Index of `id` if it names a live task.
    pub(crate) fn live_index(&self, id: TaskId) -> Option<usize> {
        let slot = self.tasks.get(id.index())?;
        (slot.active && slot.generation == id.generation()).then_some(id.index())
    }
}

/// Callback of the auxiliary tasks created by [`Scheduler::delay`].
struct DelayedResume;

impl Runnable for DelayedResume {
    fn run(&mut self, ctx: &mut TaskContext<'_>) {
        let own = ctx.id().index();
        let scheduler = ctx.scheduler();
        if let Some(target) = scheduler.delayed.get_mut(own).and_then(Option::take) {
            scheduler.resume(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MAX_INTERVAL_MS;
    use crate::coroutine::Wait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    fn scheduler(capacity: usize) -> (Scheduler, Clock) {
        let clock = Clock::new();
        let config = SchedulerConfig {
            capacity,
            ..SchedulerConfig::default()
        };
        (Scheduler::with_clock(config, clock.clone()).unwrap(), clock)
    }

    fn counter() -> (Arc<AtomicU32>, impl FnMut(&mut TaskContext<'_>) + Send + 'static) {
        let hits = Arc::new(AtomicU32::new(0));
        let counted = hits.clone();
        (hits, move |_: &mut TaskContext<'_>| {
            counted.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn noop(_: &mut TaskContext<'_>) {}

    #[test]
    fn periodic_task_fires_on_its_interval_without_drift() {
        let (mut s, clock) = scheduler(4);
        let (hits, task) = counter();
        let id = s.add(task, 100, "X").unwrap();
        assert_eq!(s.next_run_time(id), Some(100));

        clock.set(99);
        assert_eq!(s.run_pending(), 0);
        clock.set(100);
        assert_eq!(s.run_pending(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(s.next_run_time(id), Some(200));
        assert_eq!(s.task(id).unwrap().last_run, 100);
    }

    #[test]
    fn one_shot_telemetry_survives_until_slot_reuse() {
        let (mut s, clock) = scheduler(4);
        let (hits, task) = counter();
        let y = s.add_one_shot(task, 50, "Y").unwrap();

        clock.set(50);
        assert_eq!(s.run_pending(), 1);
        clock.set(500);
        assert_eq!(s.run_pending(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(!s.is_active(y));
        assert_ne!(s.actual_run_interval(y), INVALID_RUN_INTERVAL);
        let info = s.task(y).unwrap();
        assert_eq!(info.name, "Y");
        assert_eq!(info.interval_ms, 0);
        assert!(!info.active);
        assert_eq!(s.free_nodes(), 4);

        let z = s.add(noop, 10, "Z").unwrap();
        assert_eq!(z.index(), y.index());
        assert_eq!(s.actual_run_interval(y), INVALID_RUN_INTERVAL);
        assert!(s.task(y).is_none());
    }

    #[test]
    fn sixteenth_task_exhausts_default_capacity() {
        let mut s = Scheduler::default();
        for i in 0..15 {
            s.add(noop, 10 + i, format!("T{}", i)).unwrap();
        }
        assert!(matches!(s.add(noop, 10, "T15"), Err(Error::ResourceExhausted)));
        assert!(matches!(
            s.add_one_shot(noop, 10, "T16"),
            Err(Error::ResourceExhausted)
        ));
        assert_eq!(s.active_tasks(), 15);
        assert_eq!(s.free_nodes(), 0);
    }

    #[test]
    fn delayed_coroutine_resumes_immediately_after_waker_fires() {
        let (mut s, clock) = scheduler(4);
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = log.clone();
        let id = s
            .add(
                move |ctx: &mut TaskContext<'_>| {
                    let now = ctx.now();
                    let outcome = ctx.wait(1u16, 30);
                    seen.lock().unwrap().push((now, outcome));
                },
                1000,
                "Sleeper",
            )
            .unwrap();

        clock.set(1000);
        assert_eq!(s.run_pending(), 1);
        assert_eq!(
            s.coroutine(id),
            Some(CoroutineContext {
                resume_point: 1,
                deadline: 1030,
            })
        );
        assert_eq!(s.task(id).unwrap().state, TaskState::Suspended);
        assert_eq!(s.node_location(id), Some(NodeLocation::Held));
        assert_eq!(s.next_run_time(id), None);

        let queue = s.ready_queue();
        assert_eq!(queue.len(), 1);
        let (waker, due) = queue[0];
        assert_eq!(due, 1030);
        assert_eq!(s.task(waker).unwrap().name, "DelayResume_0");

        clock.set(1030);
        assert_eq!(s.run_pending(), 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec![(1000, Wait::Pending), (1030, Wait::Elapsed)]
        );
        assert_eq!(s.coroutine(id).unwrap().resume_point(), 0);
        assert_eq!(s.next_run_time(id), Some(2030));
        assert!(!s.is_active(waker));
        assert_eq!(s.free_nodes(), 3);
    }

    #[test]
    fn generation_does_not_repeat_after_u16_reuses() {
        let (mut s, _clock) = scheduler(2);
        let old = s.add(noop, 10, "Old").unwrap();
        s.remove(old);
        s.tasks[old.index()].generation = old.generation() + u32::from(u16::MAX);

        let new = s.add(noop, 10, "New").unwrap();
        assert_eq!(new.index(), old.index());
        assert_eq!(new.generation(), old.generation() + 65536);
        assert!(!s.is_active(old));
        assert!(s.task(old).is_none());
        s.remove(old);
        assert!(s.is_active(new));
    }

    #[test]
    fn early_resumes_reuse_the_pending_waker() {
        let (mut s, clock) = scheduler(4);
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = log.clone();
        let id = s
            .add(
                move |ctx: &mut TaskContext<'_>| {
                    seen.lock().unwrap().push(ctx.wait(1u16, 1000));
                },
                10,
                "LongWait",
            )
            .unwrap();

        clock.set(10);
        assert_eq!(s.run_pending(), 1);
        assert_eq!(s.active_tasks(), 2);
        assert!(s.has_pending_wake(id));

        for now in 11..=13 {
            clock.set(now);
            s.resume(id);
            assert_eq!(s.run_pending(), 1);
            assert_eq!(s.active_tasks(), 2);
            assert_eq!(s.task(id).unwrap().state, TaskState::Suspended);
        }
        s.change_interval(id, 20);
        clock.set(14);
        assert_eq!(s.run_pending(), 1);
        assert_eq!(s.active_tasks(), 2);

        let other = s.add(noop, 500, "Other").unwrap();
        assert!(other.is_valid());
        s.remove(other);

        clock.set(1010);
        assert_eq!(s.run_pending(), 2);
        assert!(!s.has_pending_wake(id));
        assert_eq!(s.active_tasks(), 1);
        assert_eq!(log.lock().unwrap().last(), Some(&Wait::Elapsed));
        assert_eq!(log.lock().unwrap().len(), 6);
    }

    #[test]
    fn resume_of_a_parked_coroutine_is_due_now() {
        let (mut s, clock) = scheduler(4);
        let id = s.add(noop, 100, "Parked").unwrap();
        s.coroutines[id.index()] = CoroutineContext {
            resume_point: 3,
            deadline: 77,
        };

        s.suspend(id);
        clock.set(40);
        s.resume(id);
        assert_eq!(s.next_run_time(id), Some(40));
    }

    #[test]
    fn suspend_resume_leaves_coroutine_untouched() {
        let (mut s, clock) = scheduler(4);
        let id = s.add(noop, 100, "A").unwrap();
        let saved = CoroutineContext {
            resume_point: 9,
            deadline: 1234,
        };
        s.coroutines[id.index()] = saved;

        s.suspend(id);
        assert_eq!(s.coroutine(id), Some(saved));
        assert_eq!(s.node_location(id), Some(NodeLocation::Held));
        assert_eq!(s.free_nodes(), 3);

        clock.advance(5);
        s.resume(id);
        assert_eq!(s.coroutine(id), Some(saved));
        assert_eq!(s.node_location(id), Some(NodeLocation::Ready));
    }

    #[test]
    fn plain_resume_waits_one_interval() {
        let (mut s, clock) = scheduler(4);
        let id = s.add(noop, 100, "A").unwrap();
        s.suspend(id);
        assert_eq!(s.task(id).unwrap().state, TaskState::Suspended);

        clock.set(500);
        assert_eq!(s.run_pending(), 0);
        s.resume(id);
        assert_eq!(s.next_run_time(id), Some(600));
        assert_eq!(s.task(id).unwrap().state, TaskState::Ready);
    }

    #[test]
    fn non_positive_intervals_become_one_millisecond() {
        let (mut s, clock) = scheduler(4);
        let id = s.add(noop, 100, "A").unwrap();
        clock.set(10);

        s.change_interval(id, 0);
        assert_eq!(s.task(id).unwrap().interval_ms, 1);
        assert_eq!(s.next_run_time(id), Some(11));

        s.change_interval(id, -5);
        assert_eq!(s.task(id).unwrap().interval_ms, 1);

        s.change_interval(id, 250);
        assert_eq!(s.next_run_time(id), Some(260));
    }

    #[test]
    fn change_interval_resumes_a_suspended_task() {
        let (mut s, _clock) = scheduler(4);
        let id = s.add(noop, 100, "A").unwrap();
        s.suspend(id);
        s.change_interval(id, 20);
        assert_eq!(s.task(id).unwrap().state, TaskState::Ready);
        assert_eq!(s.next_run_time(id), Some(20));
    }

    #[test]
    fn intervals_are_capped_to_the_orderable_range() {
        let (mut s, _clock) = scheduler(4);
        let id = s.add(noop, u32::MAX, "Huge").unwrap();
        assert_eq!(s.task(id).unwrap().interval_ms, MAX_INTERVAL_MS);
        s.change_interval(id, i64::MAX);
        assert_eq!(s.task(id).unwrap().interval_ms, MAX_INTERVAL_MS);
    }

    #[test]
    fn removing_itself_mid_run_frees_the_node() {
        let (mut s, clock) = scheduler(2);
        let id = s
            .add(
                |ctx: &mut TaskContext<'_>| ctx.remove(),
                10,
                "Quitter",
            )
            .unwrap();

        clock.set(10);
        assert_eq!(s.run_pending(), 1);
        assert!(!s.is_active(id));
        assert_eq!(s.free_nodes(), 2);
        assert_eq!(s.actual_run_interval(id), INVALID_RUN_INTERVAL);
        assert!(s.ready_queue().is_empty());
    }

    #[test]
    fn replacing_itself_mid_run_keeps_the_new_task() {
        let (mut s, clock) = scheduler(1);
        let (hits, task) = counter();
        let mut task = Some(task);
        let old = s
            .add(
                move |ctx: &mut TaskContext<'_>| {
                    ctx.remove();
                    if let Some(task) = task.take() {
                        ctx.scheduler().add(task, 5, "Successor").unwrap();
                    }
                },
                10,
                "Predecessor",
            )
            .unwrap();

        clock.set(10);
        assert_eq!(s.run_pending(), 1);
        assert!(!s.is_active(old));
        assert_eq!(s.active_tasks(), 1);

        clock.set(15);
        assert_eq!(s.run_pending(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stale_handles_do_not_touch_the_new_occupant() {
        let (mut s, _clock) = scheduler(1);
        let old = s.add(noop, 10, "Old").unwrap();
        s.remove(old);
        let new = s.add(noop, 10, "New").unwrap();
        assert_eq!(old.index(), new.index());

        s.suspend(old);
        s.remove(old);
        s.change_interval(old, 99);
        assert!(s.is_active(new));
        assert_eq!(s.next_run_time(new), Some(10));
        assert_eq!(s.delay(old, 5).unwrap(), TaskId::INVALID);
        assert_eq!(s.actual_run_interval(TaskId::INVALID), INVALID_RUN_INTERVAL);
    }

    #[test]
    fn delay_without_a_free_slot_leaves_the_task_scheduled() {
        let (mut s, _clock) = scheduler(1);
        let id = s.add(noop, 10, "Only").unwrap();
        assert!(matches!(s.delay(id, 30), Err(Error::ResourceExhausted)));
        assert_eq!(s.task(id).unwrap().state, TaskState::Ready);
        assert_eq!(s.next_run_time(id), Some(10));
    }

    #[test]
    fn removing_the_target_cancels_its_waker() {
        let (mut s, clock) = scheduler(3);
        let id = s.add(noop, 10, "Target").unwrap();
        let waker = s.delay(id, 30).unwrap();
        s.remove(id);
        let replacement = s.add(noop, 1000, "Replacement").unwrap();

        clock.set(30);
        assert_eq!(s.run_pending(), 1);
        assert!(!s.is_active(waker));
        assert_eq!(s.next_run_time(replacement), Some(1000));
    }

    #[test]
    fn equal_deadlines_run_in_insertion_order() {
        let (mut s, clock) = scheduler(4);
        let order = Arc::new(Mutex::new(Vec::new()));
        for name in ["A", "B", "C"] {
            let order = order.clone();
            s.add(
                move |_: &mut TaskContext<'_>| order.lock().unwrap().push(name),
                50,
                name,
            )
            .unwrap();
        }
        clock.set(50);
        assert_eq!(s.run_pending(), 3);
        assert_eq!(*order.lock().unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn scheduling_continues_across_the_counter_wrap() {
        let clock = Clock::starting_at(u32::MAX - 10);
        let mut s = Scheduler::with_clock(SchedulerConfig::default(), clock.clone()).unwrap();
        let (hits, task) = counter();
        let id = s.add(task, 20, "Wrap").unwrap();
        assert_eq!(s.next_run_time(id), Some(9));

        clock.advance(15);
        assert_eq!(s.run_pending(), 0);
        clock.advance(5);
        assert_eq!(s.run_pending(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(s.next_run_time(id), Some(29));
    }

    #[test]
    fn execution_time_feeds_telemetry_and_cpu_usage() {
        let (mut s, clock) = scheduler(4);
        let busy = clock.clone();
        let id = s
            .add(
                move |_: &mut TaskContext<'_>| busy.advance(5),
                10,
                "Busy",
            )
            .unwrap();

        clock.set(10);
        assert_eq!(s.run_pending(), 1);
        assert_eq!(s.actual_run_interval(id), 5);
        let info = s.task(id).unwrap();
        assert_eq!(info.max_exec_time, 5);
        assert_eq!(info.last_run, 15);
        assert_eq!(s.next_run_time(id), Some(25));

        let total = s.calculate_cpu_usage();
        assert!((s.task_usage(id) - 100.0 / 3.0).abs() < 1e-3);
        assert!(total > 0.0 && total <= 100.0);
        assert_eq!(s.task_usage(TaskId::INVALID), 0.0);
    }

    #[test]
    fn cpu_monitor_samples_periodically() {
        let (mut s, clock) = scheduler(4);
        let busy = clock.clone();
        s.add(
            move |_: &mut TaskContext<'_>| busy.advance(100),
            400,
            "Busy",
        )
        .unwrap();
        s.add_cpu_monitor().unwrap();

        clock.set(400);
        s.run_pending();
        clock.set(1000);
        s.run_pending();
        // Busy ran first and pushed the clock past the monitor's deadline
        assert_eq!(s.cpu().last_sample_time(), clock.now());
        assert_eq!(clock.now(), 1100);
        assert!(s.total_usage() > 0.0);
    }

    #[test]
    fn init_drops_everything() {
        let (mut s, _clock) = scheduler(3);
        let a = s.add(noop, 10, "A").unwrap();
        let b = s.add_one_shot(noop, 10, "B").unwrap();
        s.suspend(a);

        s.init();
        assert_eq!(s.active_tasks(), 0);
        assert_eq!(s.free_nodes(), 3);
        assert!(s.task(a).is_none());
        assert!(s.task(b).is_none());
        assert!(s.ready_queue().is_empty());
    }

    #[test]
    fn invalid_capacity_is_rejected() {
        let config = SchedulerConfig {
            capacity: 0,
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            Scheduler::new(config),
            Err(Error::InvalidConfig(_))
        ));
    }
}
