// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide default coordinator.
//!
//! Thin facade over one lazily created [`Shutdown`] for programs that do not
//! want to pass a coordinator around. Everything here forwards to [`global()`].
//!
//! ```rust,ignore
//! #[tokio::main]
//! async fn main() {
//!     graceful_shutdown::global::add_cleanup(|ctx| async move {
//!         flush_buffers(ctx).await;
//!     });
//!     graceful_shutdown::global::listen().expect("signal handlers");
//!     if let Err(cause) = graceful_shutdown::global::done().await {
//!         eprintln!("shutdown: {cause}");
//!         std::process::exit(1);
//!     }
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::core::error::{Cause, ShutdownResult};
use crate::core::util::cleanup::CleanupContext;
use crate::core::util::logger::Logger;
use crate::core::util::shutdown::Shutdown;

static GLOBAL: Lazy<Shutdown> = Lazy::new(Shutdown::new);

/// The process-wide coordinator.
pub fn global() -> &'static Shutdown {
    &GLOBAL
}

pub fn set_logger<L: Logger + 'static>(logger: L) {
    GLOBAL.set_logger(logger);
}

pub fn set_logger_arc(logger: Arc<dyn Logger>) {
    GLOBAL.set_logger_arc(logger);
}

pub fn set_graceful_timeout(timeout: Duration) {
    GLOBAL.set_graceful_timeout(timeout);
}

pub fn add_cleanup<F, Fut>(f: F)
where
    F: Fn(CleanupContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    GLOBAL.add_cleanup(f);
}

pub fn add_blocking_cleanup<F>(f: F)
where
    F: Fn(CleanupContext) + Send + Sync + 'static,
{
    GLOBAL.add_blocking_cleanup(f);
}

pub fn listen() -> ShutdownResult<()> {
    GLOBAL.listen()
}

pub fn cancel(cause: Option<Cause>) {
    GLOBAL.cancel(cause);
}

pub fn cancel_with<E>(err: E)
where
    E: std::error::Error + Send + Sync + 'static,
{
    GLOBAL.cancel_with(err);
}

pub async fn done() -> Result<(), Cause> {
    GLOBAL.done().await
}

pub fn done_blocking() -> Result<(), Cause> {
    GLOBAL.done_blocking()
}
