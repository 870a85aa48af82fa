//! # Completion groups for the task tree.
//!
//! [`WaitGroup`] is a thin counter over [`tokio::sync::watch`] used by the
//! scheduler to track how many children of a node are still live. A node
//! registers a child with [`WaitGroup::add`] **before** spawning it, the
//! child signals [`WaitGroup::done`] exactly once when it retires, and the
//! parent parks on [`WaitGroup::wait`] until the count drains to zero.
//!
//! ## Rules
//! - `add` happens-before the spawned task starts; a parent can never
//!   observe a zero count between registration and startup.
//! - `done` saturates at zero; a stray signal can never panic the runtime
//!   or wrap the counter.
//! - `wait` with no registered children returns immediately.

use std::sync::Arc;

use tokio::sync::watch;

/// Counter tracking outstanding completions.
///
/// Cheap to clone (internally holds an `Arc`-backed sender); all clones
/// observe the same count.
#[derive(Clone, Debug)]
pub struct WaitGroup {
    count: Arc<watch::Sender<usize>>,
}

impl WaitGroup {
    /// Creates an empty group with a zero count.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { count: Arc::new(tx) }
    }

    /// Registers `n` more expected completions.
    pub fn add(&self, n: usize) {
        self.count.send_modify(|c| *c += n);
    }

    /// Signals one completion. Saturates at zero.
    pub fn done(&self) {
        self.count.send_modify(|c| *c = c.saturating_sub(1));
    }

    /// Returns the current number of outstanding completions.
    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    /// Waits until the count reaches zero.
    ///
    /// Returns immediately if the count is already zero. Completions added
    /// after the count has drained are not observed by an already-returned
    /// `wait`; callers register children before waiting.
    pub async fn wait(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|c| *c == 0).await;
    }
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}
