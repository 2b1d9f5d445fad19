use super::r#trait::Runnable;
use crate::task::TaskRegistration;

/// A runnable instance waiting to be added, with its schedule configuration
pub struct RunnableTask {
    pub name: &'static str,
    pub schedule_type: &'static str,
    pub schedule_value: &'static str,
    pub enabled: &'static str,
    pub time_unit: &'static str,
    pub instance: Box<dyn Runnable>,
}

impl RunnableTask {
    /// Start describing a task. Defaults to a 1000 ms interval, enabled.
    pub fn builder(name: &'static str, instance: Box<dyn Runnable>) -> RunnableTaskBuilder {
        RunnableTaskBuilder {
            task: RunnableTask {
                name,
                schedule_type: "interval",
                schedule_value: "1000",
                enabled: "true",
                time_unit: "milliseconds",
                instance,
            },
        }
    }
}

impl From<TaskRegistration> for RunnableTask {
    fn from(registration: TaskRegistration) -> Self {
        RunnableTask {
            name: registration.name,
            schedule_type: registration.schedule_type,
            schedule_value: registration.schedule_value,
            enabled: registration.enabled,
            time_unit: registration.time_unit,
            instance: Box::new(registration.handler),
        }
    }
}

/// Builder for RunnableTask
pub struct RunnableTaskBuilder {
    task: RunnableTask,
}

impl RunnableTaskBuilder {
    /// Run periodically, every `value`.
    pub fn interval(self, value: &'static str) -> Self {
        self.schedule("interval", value)
    }

    /// Run once, `value` after the task is added.
    pub fn one_shot(self, value: &'static str) -> Self {
        self.schedule("one_shot", value)
    }

    /// Set the schedule type and value verbatim, as `#[task_impl]` reports them.
    pub fn schedule(mut self, schedule_type: &'static str, value: &'static str) -> Self {
        self.task.schedule_type = schedule_type;
        self.task.schedule_value = value;
        self
    }

    /// `"true"`, `"false"` or a config placeholder.
    pub fn enabled(mut self, enabled: &'static str) -> Self {
        self.task.enabled = enabled;
        self
    }

    /// Unit applied to a bare numeric schedule value.
    pub fn time_unit(mut self, time_unit: &'static str) -> Self {
        self.task.time_unit = time_unit;
        self
    }

    pub fn build(self) -> RunnableTask {
        self.task
    }
}
