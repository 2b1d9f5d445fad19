mod builder;
mod context;
mod handle;
mod scheduler;

pub use builder::SchedulerBuilder;
pub use context::TaskContext;
pub use handle::SchedulerHandle;
pub use scheduler::{Scheduler, INVALID_RUN_INTERVAL};
