use std::fmt;

/// Handle to a task slot.
///
/// The index addresses the slot directly; the generation is bumped every
/// time the slot is handed to a new task or explicitly removed, so a stale
/// handle never reaches the slot's next occupant. The 32-bit generation only
/// repeats after 2^32 reuses of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    index: u8,
    generation: u32,
}

impl TaskId {
    /// Sentinel handle that never refers to a task.
    pub const INVALID: TaskId = TaskId {
        index: 0xFF,
        generation: 0,
    };

    pub(crate) const fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index as u8,
            generation,
        }
    }

    /// Slot index of this task.
    pub const fn index(self) -> usize {
        self.index as usize
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }

    pub const fn is_valid(self) -> bool {
        self.index != Self::INVALID.index
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}.{}", self.index, self.generation)
        } else {
            write!(f, "#invalid")
        }
    }
}
