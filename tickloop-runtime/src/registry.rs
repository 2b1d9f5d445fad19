use crate::task::TaskRegistration;

/// Global distributed slice for collecting `#[task]` functions
#[linkme::distributed_slice]
pub static TASKS: [fn() -> TaskRegistration] = [..];
