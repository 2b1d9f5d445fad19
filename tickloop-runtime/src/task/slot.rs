use crate::ready_list::NodeIndex;
use crate::runnable::Runnable;
use std::borrow::Cow;

/// Scheduling state of a task slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting in the ready list for its next run time.
    Ready,
    /// Its callback is executing right now.
    Running,
    /// Out of the ready list. Also the state of inactive slots.
    Suspended,
}

/// Task control slot.
pub(crate) struct TaskSlot {
    pub(crate) callback: Option<Box<dyn Runnable>>,
    pub(crate) interval_ms: u32,
    pub(crate) last_run: u32,
    pub(crate) max_exec_time: u32,
    pub(crate) actual_exec_time: u32,
    pub(crate) state: TaskState,
    pub(crate) active: bool,
    pub(crate) name: Cow<'static, str>,
    pub(crate) generation: u32,
    pub(crate) node: Option<NodeIndex>,
}

impl TaskSlot {
    pub(crate) fn empty() -> Self {
        Self {
            callback: None,
            interval_ms: 0,
            last_run: 0,
            max_exec_time: 0,
            actual_exec_time: 0,
            state: TaskState::Suspended,
            active: false,
            name: Cow::Borrowed(""),
            generation: 0,
            node: None,
        }
    }

    /// Drop the task and invalidate every handle to it.
    pub(crate) fn release(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self::empty();
        self.generation = generation;
    }

    pub(crate) fn info(&self) -> TaskInfo {
        TaskInfo {
            name: self.name.clone(),
            interval_ms: self.interval_ms,
            last_run: self.last_run,
            max_exec_time: self.max_exec_time,
            actual_exec_time: self.actual_exec_time,
            state: self.state,
            active: self.active,
        }
    }
}

/// Snapshot of a task's metadata and telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub name: Cow<'static, str>,
    /// 0 for one-shot tasks.
    pub interval_ms: u32,
    pub last_run: u32,
    pub max_exec_time: u32,
    pub actual_exec_time: u32,
    pub state: TaskState,
    pub active: bool,
}
