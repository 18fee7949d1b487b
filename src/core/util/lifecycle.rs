// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write-once lifecycle signal.
//!
//! A [`Lifecycle`] starts pending and moves to terminated exactly once. The first
//! writer wins; every later `terminate` is discarded. All observers see the same
//! [`TerminalCause`].

use std::sync::Arc;
use tokio::sync::watch;

use crate::core::error::Cause;

/// Cause recorded at the terminal transition. `None` is a clean termination.
pub type TerminalCause = Option<Cause>;

/// One-shot broadcast of the terminal cause.
///
/// Cloning yields another handle to the same lifecycle.
#[derive(Clone)]
pub struct Lifecycle {
    // `None` while pending, `Some(cause)` once terminated
    state: Arc<watch::Sender<Option<TerminalCause>>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    /// Move to terminated with `cause`.
    ///
    /// Returns `true` if this call performed the transition, `false` if the
    /// lifecycle had already terminated (the cause is then discarded).
    pub fn terminate(&self, cause: TerminalCause) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(cause);
            true
        })
    }

    pub fn is_terminated(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Terminal cause if terminated, `None` while pending.
    pub fn cause(&self) -> Option<TerminalCause> {
        self.state.borrow().clone()
    }

    /// Wait for the terminal transition and return its cause.
    pub async fn terminated(&self) -> TerminalCause {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here
        let cause = match rx.wait_for(|state| state.is_some()).await {
            Ok(state) => state.clone().flatten(),
            Err(_) => None,
        };
        cause
    }

    /// Blocking twin of [`terminated`](Self::terminated) for non-async callers.
    ///
    /// Must not be called from inside an async task.
    pub fn terminated_blocking(&self) -> TerminalCause {
        futures::executor::block_on(self.terminated())
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.state.borrow() {
            None => "pending".to_string(),
            Some(None) => "terminated(clean)".to_string(),
            Some(Some(cause)) => format!("terminated({})", cause),
        };
        f.debug_struct("Lifecycle").field("state", &state).finish()
    }
}
