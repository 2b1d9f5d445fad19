//! Per-task suspension state for coroutine-style delays.
//!
//! A task that needs to wait does not block: it records which suspension
//! point it stopped at, suspends itself and returns. When it is resumed the
//! callback runs again from the top, switches on the saved point and picks
//! up where it left off.
//!
//! ```rust
//! use tickloop_runtime::{ResumePoint, TaskContext};
//!
//! #[derive(Clone, Copy)]
//! enum Blink {
//!     Start = 0,
//!     LitUp = 1,
//!     Dark = 2,
//! }
//!
//! impl ResumePoint for Blink {
//!     fn to_raw(self) -> u16 {
//!         self as u16
//!     }
//!
//!     fn from_raw(raw: u16) -> Option<Self> {
//!         match raw {
//!             0 => Some(Blink::Start),
//!             1 => Some(Blink::LitUp),
//!             2 => Some(Blink::Dark),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! fn blink(ctx: &mut TaskContext<'_>) {
//!     let mut step = ctx.resume_point::<Blink>().unwrap_or(Blink::Start);
//!     loop {
//!         match step {
//!             Blink::Start => {
//!                 // led on
//!                 step = Blink::LitUp;
//!             }
//!             Blink::LitUp => {
//!                 if ctx.wait(Blink::LitUp, 200).is_pending() {
//!                     return;
//!                 }
//!                 // led off
//!                 step = Blink::Dark;
//!             }
//!             Blink::Dark => {
//!                 if ctx.wait(Blink::Dark, 800).is_pending() {
//!                     return;
//!                 }
//!                 ctx.finish();
//!                 return;
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! Only the wait/finish calls and task retirement write this state. Suspend,
//! resume and the scheduler loop leave it untouched, which is what lets the
//! callback continue from the saved point.

/// Identifier of a suspension point inside a callback.
///
/// Raw value 0 is reserved for "fresh entry, not suspended"; every real
/// suspension point needs a non-zero value. `#[derive(ResumePoint)]`
/// generates this for fieldless enums from their discriminants.
pub trait ResumePoint: Copy {
    fn to_raw(self) -> u16;
    fn from_raw(raw: u16) -> Option<Self>;
}

impl ResumePoint for u16 {
    fn to_raw(self) -> u16 {
        self
    }

    fn from_raw(raw: u16) -> Option<Self> {
        Some(raw)
    }
}

/// Saved resume point and wake-up deadline of one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoroutineContext {
    pub(crate) resume_point: u16,
    pub(crate) deadline: u32,
}

impl CoroutineContext {
    /// Raw identifier of the point the task is blocked at, 0 if none.
    pub fn resume_point(&self) -> u16 {
        self.resume_point
    }

    pub fn deadline(&self) -> u32 {
        self.deadline
    }

    /// Whether the task is currently parked at a suspension point.
    pub fn is_suspended(&self) -> bool {
        self.resume_point != 0
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Outcome of reaching a suspension point.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// The delay is over; keep executing past the point.
    Elapsed,
    /// The task is parked; return from the callback now.
    Pending,
}

impl Wait {
    pub fn is_pending(self) -> bool {
        self == Wait::Pending
    }

    pub fn is_elapsed(self) -> bool {
        self == Wait::Elapsed
    }
}
