use crate::clock::elapsed;
use tracing::debug;

/// Number of raw samples kept for smoothing.
pub const HISTORY_SIZE: usize = 3;

/// Usage reported before the first real sample.
const INITIAL_USAGE: f32 = 0.1;

/// CPU utilization tracker.
///
/// The scheduler feeds in each callback's execution time; [`calculate`]
/// turns the accumulated time into percentages over the window since the
/// previous sample. The global figure is smoothed over the last
/// [`HISTORY_SIZE`] samples, per-task figures are raw, so the per-task
/// values need not add up to the global one.
///
/// [`calculate`]: CpuUtil::calculate
#[derive(Debug, Clone)]
pub struct CpuUtil {
    total_run_time: u64,
    task_run_time: Vec<u64>,
    cpu_usage: f32,
    task_usage: Vec<f32>,
    history: [f32; HISTORY_SIZE],
    history_index: usize,
    last_sample_time: u32,
    min_window_ms: u32,
}

impl CpuUtil {
    pub fn new(capacity: usize, min_window_ms: u32, now: u32) -> Self {
        Self {
            total_run_time: 0,
            task_run_time: vec![0; capacity],
            cpu_usage: INITIAL_USAGE,
            task_usage: vec![0.0; capacity],
            history: [INITIAL_USAGE; HISTORY_SIZE],
            history_index: 0,
            last_sample_time: now,
            min_window_ms,
        }
    }

    /// Clear all accumulators and history and start a new window at `now`.
    pub fn init(&mut self, now: u32) {
        self.total_run_time = 0;
        self.task_run_time.fill(0);
        self.cpu_usage = INITIAL_USAGE;
        self.task_usage.fill(0.0);
        self.history = [INITIAL_USAGE; HISTORY_SIZE];
        self.history_index = 0;
        self.last_sample_time = now;
    }

    /// Credit `run_time` milliseconds to task `index`. Out-of-range indices
    /// are ignored.
    pub fn update_task_run_time(&mut self, index: usize, run_time: u32) {
        if let Some(slot) = self.task_run_time.get_mut(index) {
            *slot += u64::from(run_time);
            self.total_run_time += u64::from(run_time);
        }
    }

    /// Close the current window and return the smoothed total usage.
    ///
    /// Windows shorter than the configured minimum return the cached value
    /// without touching any state.
    pub fn calculate(&mut self, now: u32) -> f32 {
        let window = elapsed(now, self.last_sample_time);
        if window < self.min_window_ms.max(1) {
            return self.cpu_usage;
        }

        let raw = percent(self.total_run_time, window);
        self.history[self.history_index] = raw;
        self.history_index = (self.history_index + 1) % HISTORY_SIZE;

        // newest sample weighs HISTORY_SIZE, the oldest 1
        let mut weighted = 0.0;
        for age in 0..HISTORY_SIZE {
            let slot = (self.history_index + HISTORY_SIZE - 1 - age) % HISTORY_SIZE;
            weighted += self.history[slot] * (HISTORY_SIZE - age) as f32;
        }
        let weight_sum = (HISTORY_SIZE * (HISTORY_SIZE + 1) / 2) as f32;
        self.cpu_usage = weighted / weight_sum;

        for (usage, run_time) in self.task_usage.iter_mut().zip(&self.task_run_time) {
            *usage = percent(*run_time, window);
        }

        debug!(
            window_ms = window,
            raw_usage = raw,
            cpu_usage = self.cpu_usage,
            "CPU utilization sampled"
        );

        self.total_run_time = 0;
        self.task_run_time.fill(0);
        self.last_sample_time = now;

        self.cpu_usage
    }

    /// Usage of task `index` over the last completed window.
    pub fn task_usage(&self, index: usize) -> f32 {
        self.task_usage.get(index).copied().unwrap_or(0.0)
    }

    /// Smoothed usage over the last completed windows.
    pub fn total_usage(&self) -> f32 {
        self.cpu_usage
    }

    pub fn last_sample_time(&self) -> u32 {
        self.last_sample_time
    }
}

fn percent(run_time: u64, window: u32) -> f32 {
    let value = run_time as f64 * 100.0 / f64::from(window);
    value.clamp(0.0, 100.0) as f32
}
