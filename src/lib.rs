// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful process shutdown for tokio applications.
//!
//! A [`Shutdown`] coordinator waits for SIGINT/SIGTERM (or any event pushed
//! through its [`TerminationNotifier`]), runs the registered cleanup callbacks
//! concurrently under a bounded time budget, and then releases every caller
//! waiting in [`Shutdown::done`]. [`Shutdown::cancel`] ends the lifecycle
//! directly with an optional cause and skips cleanup.
//!
//! ```rust,ignore
//! use graceful_shutdown::Shutdown;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let shutdown = Shutdown::new();
//!     shutdown.set_graceful_timeout(Duration::from_secs(10));
//!     shutdown.add_cleanup(|ctx| async move {
//!         tokio::select! {
//!             _ = drain_connections() => {}
//!             _ = ctx.cancelled() => {}
//!         }
//!     });
//!     shutdown.listen()?;
//!     shutdown.done().await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod global;

pub use crate::core::config::ShutdownConfig;
pub use crate::core::error::{Cause, ShutdownError, ShutdownResult};
pub use crate::core::util::{
    Attr, BoundedJoin, CleanupContext, CleanupFn, CleanupOutcome, Lifecycle, LogLogger, Logger,
    NoopLogger, Shutdown, Signal, TerminationNotifier,
};
