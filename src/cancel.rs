use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// A shared stop signal for a move computation.
///
/// Trips either when [`CancelToken::cancel`] is called on any clone, or once the
/// optional deadline has passed. The search polls it between iterations and between
/// rollout steps, so an over-budget computation unwinds instead of running on.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that only trips when cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also trips `budget` from now.
    pub fn with_timeout(budget: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(budget),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
