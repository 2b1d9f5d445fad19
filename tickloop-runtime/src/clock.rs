use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Longest interval or delay the scheduler accepts, in milliseconds.
///
/// Deadlines are compared by signed wrapping difference, which is only
/// meaningful while every pending deadline lies within half the 32-bit range
/// of the current time.
pub const MAX_INTERVAL_MS: u32 = i32::MAX as u32;

/// Shared millisecond tick counter.
///
/// The counter is the only state written from outside the scheduler's
/// thread of control: the tick source (a timer interrupt on hardware, a
/// tokio interval on a host) calls [`Clock::update_tick`] once per
/// millisecond while the scheduler reads it. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    ticks: Arc<AtomicU32>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at `ms`.
    pub fn starting_at(ms: u32) -> Self {
        Self {
            ticks: Arc::new(AtomicU32::new(ms)),
        }
    }

    /// Current time in milliseconds since start, wrapping at `u32::MAX`.
    pub fn now(&self) -> u32 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Advance the counter by one millisecond.
    pub fn update_tick(&self) {
        // fetch_add wraps on overflow
        self.ticks.fetch_add(1, Ordering::Release);
    }

    /// Advance the counter by `ms` milliseconds at once.
    pub fn advance(&self, ms: u32) {
        self.ticks.fetch_add(ms, Ordering::Release);
    }

    /// Jump the counter to an absolute value.
    pub fn set(&self, ms: u32) {
        self.ticks.store(ms, Ordering::Release);
    }
}

/// True once `now` has reached or passed `deadline`.
pub fn deadline_reached(now: u32, deadline: u32) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}

/// True when `a` is strictly earlier than `b`.
pub fn is_before(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}

/// Milliseconds from `since` to `now`, correcting for one counter wrap.
pub fn elapsed(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Clamp a requested interval into the range the ready list can order.
pub(crate) fn clamp_interval(ms: u32) -> u32 {
    ms.min(MAX_INTERVAL_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparisons_survive_counter_wrap() {
        let before_wrap = u32::MAX - 5;
        let after_wrap = 4;
        assert!(is_before(before_wrap, after_wrap));
        assert!(!is_before(after_wrap, before_wrap));
        assert!(deadline_reached(after_wrap, before_wrap));
        assert!(!deadline_reached(before_wrap, after_wrap));
        assert_eq!(elapsed(after_wrap, before_wrap), 10);
    }

    #[test]
    fn equal_times_are_reached_but_not_before() {
        assert!(deadline_reached(100, 100));
        assert!(!is_before(100, 100));
    }

    #[test]
    fn tick_wraps_at_u32_max() {
        let clock = Clock::starting_at(u32::MAX);
        clock.update_tick();
        assert_eq!(clock.now(), 0);
    }

    #[test]
    fn clones_share_the_counter() {
        let clock = Clock::new();
        let isr_side = clock.clone();
        isr_side.advance(42);
        assert_eq!(clock.now(), 42);
    }
}
