mod metadata;
mod task;
mod r#trait;

pub use metadata::TaskMetadata;
pub use r#trait::Runnable;
pub use task::{RunnableTask, RunnableTaskBuilder};
