//! Tickloop Runtime - cooperative fixed-capacity task scheduler
//!
//! This crate provides the scheduler core: the task table and ready list,
//! coroutine-style suspension, CPU utilization tracking and a fixed-block
//! memory pool, plus the configuration and registration plumbing used by
//! the `tickloop` macros.

mod clock;
mod config;
mod coroutine;
mod cpu_util;
mod error;
mod mem_pool;
mod ready_list;
mod registry;
mod runnable;
mod scheduler;
mod task;
mod time_unit;

// Re-export public API
pub use clock::{deadline_reached, elapsed, is_before, Clock, MAX_INTERVAL_MS};
pub use crate::config::{
    load_toml_config, load_yaml_config, resolve_config_value, SchedulerConfig, MAX_CAPACITY,
};
pub use coroutine::{CoroutineContext, ResumePoint, Wait};
pub use cpu_util::{CpuUtil, HISTORY_SIZE};
pub use error::Error;
pub use linkme;
pub use mem_pool::{Block, BlockPool, MemPool, DEFAULT_BLOCK_COUNT, DEFAULT_BLOCK_SIZE};
pub use ready_list::NodeLocation;
pub use registry::TASKS;
pub use runnable::{Runnable, RunnableTask, RunnableTaskBuilder, TaskMetadata};
pub use scheduler::{
    Scheduler, SchedulerBuilder, SchedulerHandle, TaskContext, INVALID_RUN_INTERVAL,
};
pub use task::{TaskId, TaskInfo, TaskRegistration, TaskState};
pub use time_unit::{parse_interval, TimeUnit};
