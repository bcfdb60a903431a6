use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// A shared count of generation jobs currently in flight.
///
/// Jobs increment the counter when they are constructed and decrement it exactly once,
/// either when their results are collected or when they are disposed. The factory reads
/// it to decide whether the throttle's starvation escape applies, and shutdown code can
/// assert it drains back to zero.
#[derive(Debug, Clone, Default)]
pub struct InFlightCounter {
    count: Arc<AtomicUsize>,
}

impl InFlightCounter {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a job start.
    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    /// Records a job end. Saturates at zero.
    pub fn decrement(&self) {
        let _ = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                Some(count.saturating_sub(1))
            });
    }

    /// Returns the number of jobs in flight.
    pub fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}
