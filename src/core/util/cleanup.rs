// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cleanup callbacks and the deadline-bearing context handed to them.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::Instant;

/// Deadline-bearing cancellation token passed to every cleanup callback.
///
/// The context is cancelled when its deadline passes or when the cleanup run
/// that issued it returns, whichever comes first. Callbacks are expected to
/// stop promptly once cancelled; nothing forces them to.
#[derive(Clone)]
pub struct CleanupContext {
    deadline: Instant,
    // Closed when the issuing run ends
    released: watch::Receiver<()>,
}

/// Stand-in deadline for budgets too large to add to `Instant::now()`, about 30 years out.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Owner side of a [`CleanupContext`]; dropping it cancels every context issued.
pub(crate) struct CleanupScope {
    deadline: Instant,
    release: watch::Sender<()>,
}

impl CleanupScope {
    pub(crate) fn new(timeout: Duration) -> Self {
        let (release, _) = watch::channel(());
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self { deadline, release }
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.deadline
    }

    pub(crate) fn context(&self) -> CleanupContext {
        CleanupContext {
            deadline: self.deadline,
            released: self.release.subscribe(),
        }
    }
}

impl CleanupContext {
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_cancelled(&self) -> bool {
        Instant::now() >= self.deadline || self.released.has_changed().is_err()
    }

    /// Resolves once the context is cancelled.
    pub async fn cancelled(&self) {
        let mut released = self.released.clone();
        tokio::select! {
            _ = tokio::time::sleep_until(self.deadline) => {}
            // Only errors once the scope is dropped
            _ = async { while released.changed().await.is_ok() {} } => {}
        }
    }
}

impl fmt::Debug for CleanupContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupContext")
            .field("remaining", &self.remaining())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// A registered unit of shutdown work.
#[derive(Clone)]
pub enum CleanupFn {
    /// Runs as a tokio task
    Async(Arc<dyn Fn(CleanupContext) -> BoxFuture<'static, ()> + Send + Sync>),
    /// Runs on the blocking thread pool
    Blocking(Arc<dyn Fn(CleanupContext) + Send + Sync>),
}

impl CleanupFn {
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(CleanupContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        CleanupFn::Async(Arc::new(move |ctx| f(ctx).boxed()))
    }

    pub fn from_blocking<F>(f: F) -> Self
    where
        F: Fn(CleanupContext) + Send + Sync + 'static,
    {
        CleanupFn::Blocking(Arc::new(f))
    }
}

impl fmt::Debug for CleanupFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupFn::Async(_) => f.write_str("CleanupFn::Async"),
            CleanupFn::Blocking(_) => f.write_str("CleanupFn::Blocking"),
        }
    }
}
