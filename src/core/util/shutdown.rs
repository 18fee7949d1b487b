// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination
//!
//! [`Shutdown`] waits for a termination request, runs the registered cleanup
//! callbacks concurrently under a time budget, and then releases every caller
//! blocked in [`Shutdown::done`].
//!
//! Two paths end the lifecycle:
//!
//! - **Signal path** (`listen`): the first event on the inbox marks the
//!   coordinator as shutting down, runs cleanup, then terminates cleanly.
//!   Waiters return once cleanup completed or timed out.
//! - **Cancel path** (`cancel`): terminates immediately with the given cause and
//!   does NOT run cleanup. Callers using it sequence their own cleanup.
//!
//! Whichever path terminates first decides the cause every waiter observes.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::core::config::ShutdownConfig;
use crate::core::error::{Cause, ShutdownError, ShutdownResult};
use crate::core::util::bounded_join::BoundedJoin;
use crate::core::util::cleanup::{CleanupContext, CleanupFn, CleanupScope};
use crate::core::util::lifecycle::Lifecycle;
use crate::core::util::logger::{Attr, DisplayList, LogLogger, Logger};
use crate::core::util::signal::{OsSignals, Signal};

/// Capacity of the termination inbox
pub const INBOX_CAPACITY: usize = 1;

/// How a cleanup run ended. Timing out is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Nothing registered, no timer started
    NoCallbacks,
    /// Every callback returned before the deadline
    Completed,
    /// The deadline passed first; remaining callbacks were abandoned
    TimedOut,
}

impl CleanupOutcome {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CleanupOutcome::NoCallbacks => "no_callbacks",
            CleanupOutcome::Completed => "completed",
            CleanupOutcome::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for CleanupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writer side of the termination inbox, handed to signal sources.
#[derive(Debug, Clone)]
pub struct TerminationNotifier {
    tx: mpsc::Sender<Signal>,
}

impl TerminationNotifier {
    /// Deliver a termination event. Returns `false` if the inbox already holds
    /// an unconsumed event (the new one is dropped).
    pub fn notify(&self, signal: Signal) -> bool {
        self.tx.try_send(signal).is_ok()
    }
}

struct Inner {
    logger: RwLock<Arc<dyn Logger>>,
    cleanups: Mutex<Vec<CleanupFn>>,
    graceful_timeout: Mutex<Duration>,
    signals: Mutex<Vec<Signal>>,
    lifecycle: Lifecycle,
    shutting_down: AtomicBool,
    notifier: TerminationNotifier,
    // Taken by the first `listen()`
    inbox: Mutex<Option<mpsc::Receiver<Signal>>>,
}

/// Shutdown coordinator.
///
/// Cheap to clone; clones share the same lifecycle, registry and inbox.
#[derive(Clone)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shutdown {
    pub fn new() -> Self {
        Self::with_config(&ShutdownConfig::default())
    }

    pub fn with_config(config: &ShutdownConfig) -> Self {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                logger: RwLock::new(Arc::new(LogLogger)),
                cleanups: Mutex::new(Vec::new()),
                graceful_timeout: Mutex::new(config.graceful_timeout()),
                signals: Mutex::new(config.signals.clone()),
                lifecycle: Lifecycle::new(),
                shutting_down: AtomicBool::new(false),
                notifier: TerminationNotifier { tx },
                inbox: Mutex::new(Some(rx)),
            }),
        }
    }

    pub fn set_logger<L: Logger + 'static>(&self, logger: L) {
        self.set_logger_arc(Arc::new(logger));
    }

    pub fn set_logger_arc(&self, logger: Arc<dyn Logger>) {
        *self
            .inner
            .logger
            .write()
            .unwrap_or_else(PoisonError::into_inner) = logger;
    }

    fn log(&self, msg: &str, attrs: &[Attr<'_>]) {
        let logger = Arc::clone(&self.inner.logger.read().unwrap_or_else(PoisonError::into_inner));
        logger.info(msg, attrs);
    }

    /// Replace the cleanup time budget. A run already in progress keeps the
    /// budget it started with.
    pub fn set_graceful_timeout(&self, timeout: Duration) {
        *lock(&self.inner.graceful_timeout) = timeout;
    }

    pub fn graceful_timeout(&self) -> Duration {
        *lock(&self.inner.graceful_timeout)
    }

    /// Replace the OS signals observed by `listen()`. Has no effect once listening.
    pub fn set_signals(&self, signals: Vec<Signal>) {
        *lock(&self.inner.signals) = signals;
    }

    pub fn signals(&self) -> Vec<Signal> {
        lock(&self.inner.signals).clone()
    }

    /// Register an async cleanup callback.
    ///
    /// Callbacks registered after a cleanup run has started are kept but will
    /// not be part of that run.
    pub fn add_cleanup<F, Fut>(&self, f: F)
    where
        F: Fn(CleanupContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.add_cleanups([CleanupFn::from_async(f)]);
    }

    /// Register a blocking cleanup callback, run on tokio's blocking pool.
    pub fn add_blocking_cleanup<F>(&self, f: F)
    where
        F: Fn(CleanupContext) + Send + Sync + 'static,
    {
        self.add_cleanups([CleanupFn::from_blocking(f)]);
    }

    pub fn add_cleanups(&self, callbacks: impl IntoIterator<Item = CleanupFn>) {
        lock(&self.inner.cleanups).extend(callbacks);
    }

    pub fn cleanup_count(&self) -> usize {
        lock(&self.inner.cleanups).len()
    }

    /// Inbox writer for external termination sources.
    pub fn notifier(&self) -> TerminationNotifier {
        self.inner.notifier.clone()
    }

    /// Start watching for a termination event. Returns immediately.
    ///
    /// Installs handlers for the configured OS signals and spawns the listener
    /// task. Only the first call has any effect.
    pub fn listen(&self) -> ShutdownResult<()> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| ShutdownError::NoRuntime)?;

        let mut slot = lock(&self.inner.inbox);
        let Some(inbox) = slot.take() else {
            self.log("Shutdown already listening", &[]);
            return Ok(());
        };

        let signals = self.signals();
        let os_signals = match OsSignals::install(&signals) {
            Ok(os_signals) => os_signals,
            Err(e) => {
                // Leave the inbox in place so a later call can retry
                *slot = Some(inbox);
                return Err(e);
            }
        };
        drop(slot);

        self.log("Shutdown listen", &[("signals", &DisplayList(&signals))]);

        handle.spawn(forward_os_signals(
            os_signals,
            self.notifier(),
            self.inner.lifecycle.clone(),
        ));
        handle.spawn(self.clone().run_listener(inbox));
        Ok(())
    }

    async fn run_listener(self, mut inbox: mpsc::Receiver<Signal>) {
        let received = tokio::select! {
            received = inbox.recv() => received,
            _ = self.inner.lifecycle.terminated() => {
                log::debug!("Shutdown listener retired, lifecycle already terminated");
                return;
            }
        };

        // Terminates even if cleanup unwinds, so waiters are always released
        let _terminate = TerminateOnDrop(self.inner.lifecycle.clone());
        if let Some(signal) = received {
            self.log("Shutdown signal received", &[("signal", &signal)]);
            self.inner.shutting_down.store(true, Ordering::SeqCst);
            self.run_cleanup().await;
        }
    }

    /// Run every registered callback concurrently and wait for them, bounded by
    /// the graceful timeout.
    ///
    /// Callbacks still running at the deadline are abandoned, not stopped. Their
    /// contexts are cancelled when this returns.
    pub async fn run_cleanup(&self) -> CleanupOutcome {
        let callbacks = lock(&self.inner.cleanups).clone();
        if callbacks.is_empty() {
            self.log("Shutdown no cleanup callbacks", &[]);
            return CleanupOutcome::NoCallbacks;
        }

        let timeout = self.graceful_timeout();
        let scope = CleanupScope::new(timeout);
        let join = BoundedJoin::new();
        for callback in &callbacks {
            let ctx = scope.context();
            match callback {
                CleanupFn::Async(f) => join.submit(f(ctx)),
                CleanupFn::Blocking(f) => {
                    let f = Arc::clone(f);
                    join.submit_blocking(move || f(ctx));
                }
            }
        }

        let start = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = join.wait() => CleanupOutcome::Completed,
            _ = tokio::time::sleep_until(scope.deadline()) => CleanupOutcome::TimedOut,
        };

        let elapsed_ms = start.elapsed().as_millis();
        let timeout_ms = timeout.as_millis();
        let total = callbacks.len();
        let abandoned = join.pending();
        match outcome {
            CleanupOutcome::TimedOut => self.log(
                "Shutdown cleanup timed out",
                &[
                    ("callbacks", &total),
                    ("abandoned", &abandoned),
                    ("timeout_ms", &timeout_ms),
                ],
            ),
            _ => self.log(
                "Shutdown cleanup completed",
                &[("callbacks", &total), ("elapsed_ms", &elapsed_ms)],
            ),
        }
        outcome
    }

    /// End the lifecycle with `cause` (`None` is a clean shutdown).
    ///
    /// Only the first termination counts. Cleanup callbacks are not run.
    pub fn cancel(&self, cause: Option<Cause>) {
        if !self.inner.lifecycle.terminate(cause) {
            log::debug!("Shutdown cancel ignored, lifecycle already terminated");
        }
    }

    /// Shorthand for `cancel(Some(err))`.
    pub fn cancel_with<E>(&self, err: E)
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cancel(Some(Arc::new(err)));
    }

    /// Wait for the lifecycle to terminate.
    ///
    /// Returns `Ok(())` for a clean termination and the recorded cause
    /// otherwise. Every caller observes the same result.
    pub async fn done(&self) -> Result<(), Cause> {
        match self.inner.lifecycle.terminated().await {
            None => Ok(()),
            Some(cause) => Err(cause),
        }
    }

    /// Blocking twin of [`done`](Self::done). Must not be called from an async task.
    pub fn done_blocking(&self) -> Result<(), Cause> {
        futures::executor::block_on(self.done())
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.lifecycle.is_terminated()
    }

    /// True once a termination event was consumed or the lifecycle ended.
    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::SeqCst) || self.is_terminated()
    }
}

/// Commits a clean termination when dropped. A cause recorded earlier wins.
struct TerminateOnDrop(Lifecycle);

impl Drop for TerminateOnDrop {
    fn drop(&mut self) {
        self.0.terminate(None);
    }
}

async fn forward_os_signals(
    mut os_signals: OsSignals,
    notifier: TerminationNotifier,
    lifecycle: Lifecycle,
) {
    loop {
        tokio::select! {
            received = os_signals.recv() => match received {
                Some(signal) => {
                    if !notifier.notify(signal) {
                        log::debug!("{} dropped, termination already pending", signal);
                    }
                }
                None => return,
            },
            _ = lifecycle.terminated() => return,
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Shutdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shutdown")
            .field("lifecycle", &self.inner.lifecycle)
            .field("shutting_down", &self.is_shutting_down())
            .field("graceful_timeout", &self.graceful_timeout())
            .field("cleanups", &self.cleanup_count())
            .finish()
    }
}
