use crate::time_unit::TimeUnit;

/// Schedule a `#[task_impl]` type declares for itself.
///
/// Values are the raw attribute strings; placeholders are resolved by
/// [`SchedulerBuilder::runnable`](crate::SchedulerBuilder::runnable).
pub trait TaskMetadata {
    fn name() -> &'static str;
    /// `"interval"` or `"one_shot"`.
    fn schedule_type() -> &'static str;
    fn schedule_value() -> &'static str;
    fn enabled() -> &'static str;
    fn time_unit() -> &'static str;

    /// Set when the attribute named a `TimeUnit::*` path instead of a string.
    fn time_unit_enum() -> Option<TimeUnit> {
        None
    }
}
