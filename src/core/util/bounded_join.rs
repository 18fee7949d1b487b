// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out join: start any number of independent tasks and learn when they
//! have all finished.
//!
//! [`BoundedJoin`] is a counting completion barrier. It knows nothing about
//! deadlines; callers race [`BoundedJoin::wait`] against their own timer.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct JoinState {
    pending: usize,
    done: bool,
}

/// Counting barrier over concurrently running tasks.
#[derive(Clone)]
pub struct BoundedJoin {
    state: Arc<watch::Sender<JoinState>>,
}

/// Decrements the pending count when the task ends, including by panic.
struct PendingGuard {
    state: Arc<watch::Sender<JoinState>>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.state.send_if_modified(|s| {
            s.pending = s.pending.saturating_sub(1);
            s.pending == 0
        });
    }
}

impl BoundedJoin {
    pub fn new() -> Self {
        let (state, _) = watch::channel(JoinState::default());
        Self {
            state: Arc::new(state),
        }
    }

    fn enter(&self) -> PendingGuard {
        self.state.send_modify(|s| s.pending += 1);
        PendingGuard {
            state: Arc::clone(&self.state),
        }
    }

    /// Spawn `task` on the tokio runtime and count it as pending until it ends.
    ///
    /// Panics if called outside a tokio runtime, like `tokio::spawn`.
    pub fn submit<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = self.enter();
        tokio::spawn(async move {
            let _guard = guard;
            task.await;
        });
    }

    /// Run a blocking closure on tokio's blocking pool.
    pub fn submit_blocking<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = self.enter();
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            task();
        });
    }

    /// Number of submitted tasks still running.
    pub fn pending(&self) -> usize {
        self.state.borrow().pending
    }

    /// Whether a `wait` has observed every task finished.
    pub fn is_done(&self) -> bool {
        self.state.borrow().done
    }

    /// Wait until no task is pending, then latch the done flag.
    ///
    /// Resolves immediately when nothing was submitted.
    pub async fn wait(&self) {
        let mut rx = self.state.subscribe();
        // The sender is owned by `self`; the channel stays open while we wait
        let _ = rx.wait_for(|s| s.pending == 0).await;
        self.state.send_if_modified(|s| {
            if s.done {
                return false;
            }
            s.done = true;
            true
        });
    }

    /// Blocking twin of [`wait`](Self::wait). Must not be called from an async task.
    pub fn wait_blocking(&self) {
        futures::executor::block_on(self.wait())
    }
}

impl Default for BoundedJoin {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BoundedJoin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = *self.state.borrow();
        f.debug_struct("BoundedJoin")
            .field("pending", &state.pending)
            .field("done", &state.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_wait_without_tasks() {
        let join = BoundedJoin::new();
        assert!(!join.is_done());
        join.wait().await;
        assert!(join.is_done());
        assert_eq!(join.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_staggered_tasks() {
        let join = BoundedJoin::new();
        let finished = Arc::new(AtomicUsize::new(0));

        for delay in [30u64, 10, 50, 20] {
            let finished = Arc::clone(&finished);
            join.submit(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(join.pending(), 4);

        let start = Instant::now();
        join.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(finished.load(Ordering::SeqCst), 4);
        assert_eq!(join.pending(), 0);
        assert!(join.is_done());
    }

    #[tokio::test]
    async fn test_panicking_task_still_counts() {
        let join = BoundedJoin::new();
        join.submit(async { panic!("task failure") });
        join.submit(async {});
        tokio::time::timeout(Duration::from_secs(5), join.wait())
            .await
            .expect("join should complete despite a panicking task");
        assert_eq!(join.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_tasks() {
        let join = BoundedJoin::new();
        let finished = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let finished = Arc::clone(&finished);
            join.submit_blocking(move || {
                std::thread::sleep(Duration::from_millis(20));
                finished.fetch_add(1, Ordering::SeqCst);
            });
        }
        join.wait().await;
        assert_eq!(finished.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_multiple_waiters() {
        let join = BoundedJoin::new();
        join.submit(tokio::time::sleep(Duration::from_millis(10)));

        let a = join.clone();
        let b = join.clone();
        tokio::join!(a.wait(), b.wait());
        assert!(join.is_done());
    }

    #[test]
    fn test_wait_blocking_without_runtime() {
        let join = BoundedJoin::new();
        join.wait_blocking();
        assert!(join.is_done());
    }
}
