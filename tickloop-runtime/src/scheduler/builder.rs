use super::scheduler::Scheduler;
use crate::clock::{clamp_interval, Clock};
use crate::config::{load_toml_config, load_yaml_config, resolve_config_value, SchedulerConfig};
use crate::error::Error;
use crate::registry::TASKS;
use crate::runnable::{Runnable, RunnableTask, TaskMetadata};
use crate::task::TaskId;
use crate::time_unit::{parse_interval, TimeUnit};
use config::Config;
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, info, warn};

/// Builder for the scheduler
///
/// Collects task registrations, resolves their `${...}` placeholders
/// against the loaded configuration and adds them to a freshly sized
/// [`Scheduler`] in registration order.
pub struct SchedulerBuilder {
    config: Config,
    settings: Option<SchedulerConfig>,
    clock: Option<Clock>,
    cpu_monitor: bool,
    tasks: Vec<RunnableTask>,
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerBuilder {
    /// Create a new scheduler builder with default config (empty)
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create with custom config
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            settings: None,
            clock: None,
            cpu_monitor: false,
            tasks: Vec::new(),
        }
    }

    /// Create with TOML config file
    pub fn with_toml<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Ok(Self::with_config(load_toml_config(path)?))
    }

    /// Create with YAML config file
    pub fn with_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Ok(Self::with_config(load_yaml_config(path)?))
    }

    /// Use these settings instead of the config's `[scheduler]` table.
    pub fn settings(mut self, settings: SchedulerConfig) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Read time from a shared clock, typically one a test advances by hand.
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Also add the periodic CPU utilization task.
    pub fn cpu_monitor(mut self) -> Self {
        self.cpu_monitor = true;
        self
    }

    /// Queue every function annotated with `#[task]`.
    pub fn register_all(mut self) -> Self {
        self.tasks
            .extend(TASKS.iter().map(|registration| RunnableTask::from(registration())));
        self
    }

    /// Queue a periodic task. `interval` accepts the same forms as the
    /// `#[task]` attribute, placeholders included.
    pub fn task<R>(self, name: &'static str, interval: &'static str, runnable: R) -> Self
    where
        R: Runnable + 'static,
    {
        let task = RunnableTask::builder(name, Box::new(runnable))
            .interval(interval)
            .build();
        self.queue(task)
    }

    /// Queue a task that runs once, `delay` after the scheduler is built.
    pub fn one_shot<R>(self, name: &'static str, delay: &'static str, runnable: R) -> Self
    where
        R: Runnable + 'static,
    {
        let task = RunnableTask::builder(name, Box::new(runnable))
            .one_shot(delay)
            .build();
        self.queue(task)
    }

    /// Queue an instance whose schedule comes from `#[task_impl]`.
    pub fn runnable<T>(self, instance: T) -> Self
    where
        T: Runnable + TaskMetadata + 'static,
    {
        let time_unit = T::time_unit_enum().map_or(T::time_unit(), |unit| unit.as_str());
        let task = RunnableTask::builder(T::name(), Box::new(instance))
            .schedule(T::schedule_type(), T::schedule_value())
            .enabled(T::enabled())
            .time_unit(time_unit)
            .build();
        self.queue(task)
    }

    /// Queue a fully described task.
    pub fn queue(mut self, task: RunnableTask) -> Self {
        self.tasks.push(task);
        self
    }

    /// Build the scheduler and add every queued task.
    ///
    /// Invalid settings fail the build. A task that is disabled, or whose
    /// registration cannot be resolved or added, is logged and skipped.
    pub fn build(self) -> Result<Scheduler, Error> {
        let settings = match self.settings {
            Some(settings) => settings,
            None => SchedulerConfig::from_config(&self.config)?,
        };
        let mut scheduler = Scheduler::with_clock(settings, self.clock.unwrap_or_default())?;

        info!(
            tasks = self.tasks.len(),
            capacity = scheduler.capacity(),
            "Building scheduler"
        );

        let mut added = 0;
        for task in self.tasks {
            let name = task.name;
            match Self::add_task(&mut scheduler, &self.config, task) {
                Ok(Some(id)) => {
                    added += 1;
                    debug!(task = name, id = %id, "Task registered");
                }
                Ok(None) => warn!(task = name, "Task disabled, skipping"),
                Err(e) => warn!(task = name, error = %e, "Failed to register task"),
            }
        }

        if self.cpu_monitor {
            match scheduler.add_cpu_monitor() {
                Ok(_) => added += 1,
                Err(e) => warn!(error = %e, "Failed to add CPU monitor"),
            }
        }

        info!(added, "Scheduler built");
        Ok(scheduler)
    }

    fn add_task(
        scheduler: &mut Scheduler,
        config: &Config,
        task: RunnableTask,
    ) -> Result<Option<TaskId>, Error> {
        let enabled = resolve_config_value(task.enabled, config)?;
        if enabled.trim().eq_ignore_ascii_case("false") {
            return Ok(None);
        }

        let time_unit_str = resolve_config_value(task.time_unit, config)?;
        let time_unit = time_unit_str.parse().unwrap_or_else(|_| {
            warn!(task = task.name, time_unit = %time_unit_str, "Invalid time_unit, using milliseconds");
            TimeUnit::Milliseconds
        });

        let value = resolve_config_value(task.schedule_value, config)?;
        let millis = clamp_interval(parse_interval(&value, time_unit)?);
        let name = Cow::Borrowed(task.name);

        let id = match task.schedule_type {
            "interval" => scheduler.insert_task(task.instance, millis, millis, name)?,
            "one_shot" => scheduler.insert_task(task.instance, 0, millis, name)?,
            other => {
                return Err(Error::InvalidConfig(format!(
                    "unknown schedule type '{}'",
                    other
                )))
            }
        };
        Ok(Some(id))
    }
}
