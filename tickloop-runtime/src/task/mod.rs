mod id;
mod metadata;
mod slot;

pub use id::TaskId;
pub use metadata::TaskRegistration;
pub use slot::{TaskInfo, TaskState};
pub(crate) use slot::TaskSlot;
