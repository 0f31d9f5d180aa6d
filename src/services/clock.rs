use std::time::Instant;

/// Clock provides monotonic timestamps to the detector loop.
///
/// The drag state machine never reads time on its own: every tick gets its
/// `now` from here, so tests can swap in a clock they advance by hand.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock backed by `Instant::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
pub use manual::ManualClock;
