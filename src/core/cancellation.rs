use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A thread-safe, reference-counted cooperative cancellation flag.
///
/// `CancellationToken` is checked by background work at defined yield points (the
/// boundaries between generation stages). Cancelling never interrupts work that is
/// already executing; it only prevents the next stage from starting.
///
/// A token may have a parent. A child reports itself cancelled when either its own
/// flag or its parent's flag is set, which lets a factory cancel every job it started
/// while still allowing a single job to be cancelled on its own.
///
/// # Examples
/// ```
/// use voxel_terrain::core::CancellationToken;
///
/// let parent = CancellationToken::new();
/// let first = parent.child();
/// let second = parent.child();
///
/// first.cancel();
/// assert!(first.is_cancelled());
/// assert!(!second.is_cancelled());
///
/// parent.cancel();
/// assert!(second.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    parent: Option<Arc<AtomicBool>>,
}

impl CancellationToken {
    /// Creates a new token that is not cancelled and has no parent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that is cancelled together with `self`, but can also be
    /// cancelled independently.
    pub fn child(&self) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            parent: Some(self.cancelled.clone()),
        }
    }

    /// Sets the flag. Every clone of this token and every child observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` once this token or its parent has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancelling_a_child_leaves_the_parent_running() {
        let parent = CancellationToken::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn cancelling_the_parent_reaches_the_child_from_another_thread() {
        let parent = CancellationToken::new();
        let child = parent.child();
        let handle = std::thread::spawn(move || {
            while !child.is_cancelled() {
                std::thread::yield_now();
            }
            true
        });
        parent.cancel();
        assert!(handle.join().unwrap());
    }
}
