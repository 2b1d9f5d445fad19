//! # Tickloop - cooperative fixed-capacity task scheduler
//!
//! A non-preemptive scheduler for small control applications. Periodic and
//! one-shot callbacks run in timestamp order on one thread, driven by a
//! millisecond tick counter.
//!
//! ## Features
//!
//! - **Fixed capacity**: task slots and schedule nodes are allocated once
//! - **Coroutine-style delays**: a callback parks at a named resume point
//!   and continues from there when the delay elapses
//! - **CPU accounting**: per-task and smoothed global utilization
//! - **Block pool**: fixed-size, fixed-count memory blocks
//! - **Config support**: placeholders like `${app.interval}` resolved from
//!   TOML or YAML files and `TICKLOOP__` environment variables
//!
//! ## Quick Start
//!
//! ```rust
//! use tickloop::{task, SchedulerBuilder, TaskContext};
//!
//! #[task(interval = "500ms")]
//! fn heartbeat(ctx: &mut TaskContext<'_>) {
//!     println!("alive at {}ms", ctx.now());
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler = SchedulerBuilder::new().register_all().build()?;
//!     let handle = scheduler.start(std::time::Duration::from_millis(1));
//!
//!     tokio::time::sleep(std::time::Duration::from_millis(20)).await;
//!     let _scheduler = handle.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Manual driving
//!
//! Without tokio, advance the clock from a timer and call
//! [`Scheduler::run_pending`] from the main loop:
//!
//! ```rust
//! use tickloop::{Clock, Scheduler, SchedulerConfig, TaskContext};
//!
//! let clock = Clock::new();
//! let mut scheduler = Scheduler::with_clock(SchedulerConfig::default(), clock.clone()).unwrap();
//! scheduler.add(|_: &mut TaskContext<'_>| {}, 100, "Poll").unwrap();
//!
//! clock.advance(100);
//! assert_eq!(scheduler.run_pending(), 1);
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! [scheduler]
//! capacity = 15
//! cpu_sample_interval_ms = 1000
//!
//! [app]
//! blink = "250ms"
//! ```
//!
//! Environment variables override file values, e.g.
//! `TICKLOOP__SCHEDULER__CAPACITY=32`.

// Re-export macros
pub use tickloop_macro::{task, task_impl, ResumePoint};

// Re-export core types
pub use tickloop_runtime::{
    load_toml_config, load_yaml_config, Block, BlockPool, Clock, CoroutineContext, CpuUtil, Error,
    MemPool, NodeLocation, Runnable, RunnableTask, Scheduler, SchedulerBuilder, SchedulerConfig,
    SchedulerHandle, TaskContext, TaskId, TaskInfo, TaskMetadata, TaskState, TimeUnit, Wait,
    INVALID_RUN_INTERVAL, ResumePoint,
};

// Make tickloop_runtime available for macro expansion
pub use tickloop_runtime;
