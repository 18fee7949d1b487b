// SPDX-License-Identifier: MIT OR Apache-2.0

//! Termination signals and their OS wiring.
//!
//! The coordinator only ever sees a [`Signal`] arriving on its inbox. [`OsSignals`]
//! is the default source that feeds that inbox from the operating system via
//! `tokio::signal`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{ShutdownError, ShutdownResult};

/// A termination request delivered to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Signal {
    /// SIGINT / Ctrl-C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// SIGHUP
    Hangup,
    /// SIGQUIT
    Quit,
}

/// Signals observed when no configuration says otherwise.
pub const DEFAULT_SIGNALS: [Signal; 2] = [Signal::Interrupt, Signal::Terminate];

impl Signal {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Hangup => "SIGHUP",
            Signal::Quit => "SIGQUIT",
        }
    }

    #[cfg(unix)]
    fn kind(&self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;
        match self {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::Quit => SignalKind::quit(),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = ShutdownError;

    /// Accepts `SIGINT`, `sigint`, `int`, `interrupt` and the equivalents for the
    /// other signals (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let name = lower.strip_prefix("sig").unwrap_or(&lower);
        match name {
            "int" | "interrupt" => Ok(Signal::Interrupt),
            "term" | "terminate" => Ok(Signal::Terminate),
            "hup" | "hangup" => Ok(Signal::Hangup),
            "quit" => Ok(Signal::Quit),
            _ => Err(ShutdownError::configuration_with_key(
                format!(
                    "Invalid signal '{}'. Valid values: 'SIGINT', 'SIGTERM', 'SIGHUP', 'SIGQUIT'",
                    s
                ),
                "signals",
            )),
        }
    }
}

impl TryFrom<String> for Signal {
    type Error = ShutdownError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Signal> for String {
    fn from(signal: Signal) -> Self {
        signal.as_str().to_string()
    }
}

/// Installed OS signal handlers.
///
/// Handlers are registered eagerly by [`OsSignals::install`] so registration
/// failures surface to the caller of `listen()` rather than inside a task.
pub struct OsSignals {
    #[cfg(unix)]
    streams: Vec<(Signal, tokio::signal::unix::Signal)>,
    #[cfg(not(unix))]
    ctrl_c: bool,
}

impl OsSignals {
    /// Register handlers for `signals`. Must run inside a tokio runtime.
    #[cfg(unix)]
    pub fn install(signals: &[Signal]) -> ShutdownResult<Self> {
        let mut streams = Vec::with_capacity(signals.len());
        for signal in signals {
            let stream = tokio::signal::unix::signal(signal.kind())
                .map_err(|e| ShutdownError::signal_install(*signal, e))?;
            streams.push((*signal, stream));
        }
        Ok(Self { streams })
    }

    #[cfg(not(unix))]
    pub fn install(signals: &[Signal]) -> ShutdownResult<Self> {
        for signal in signals.iter().filter(|s| **s != Signal::Interrupt) {
            log::debug!("{} is not observable on this platform, ignoring", signal);
        }
        Ok(Self {
            ctrl_c: signals.contains(&Signal::Interrupt),
        })
    }

    /// Wait for the next delivered signal.
    ///
    /// Never resolves when no handler was installed.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> Option<Signal> {
        use futures::future::{self, FutureExt};

        if self.streams.is_empty() {
            return future::pending().await;
        }
        let waits = self
            .streams
            .iter_mut()
            .map(|(signal, stream)| {
                let signal = *signal;
                async move { stream.recv().await.map(|_| signal) }.boxed()
            })
            .collect::<Vec<_>>();
        let (received, _, _) = future::select_all(waits).await;
        received
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> Option<Signal> {
        if !self.ctrl_c {
            return futures::future::pending().await;
        }
        tokio::signal::ctrl_c().await.ok().map(|_| Signal::Interrupt)
    }
}
