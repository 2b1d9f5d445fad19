use crate::scheduler::TaskContext;
use std::fmt;

/// Task registration collected by the `#[task]` attribute.
///
/// All string fields may hold config placeholders such as
/// `${app.blink_interval:500ms}`; they are resolved when the scheduler is
/// built.
#[derive(Clone, Copy)]
pub struct TaskRegistration {
    pub name: &'static str,
    /// `"interval"` for periodic tasks, `"one_shot"` for delayed single runs.
    pub schedule_type: &'static str,
    pub schedule_value: &'static str,
    pub enabled: &'static str,
    pub time_unit: &'static str,
    pub handler: fn(&mut TaskContext<'_>),
}

impl fmt::Debug for TaskRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistration")
            .field("name", &self.name)
            .field("schedule_type", &self.schedule_type)
            .field("schedule_value", &self.schedule_value)
            .field("enabled", &self.enabled)
            .field("time_unit", &self.time_unit)
            .finish_non_exhaustive()
    }
}
