// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod bounded_join;
pub mod cleanup;
pub mod lifecycle;
pub mod logger;
pub mod shutdown;
pub mod signal;

pub use bounded_join::BoundedJoin;
pub use cleanup::{CleanupContext, CleanupFn};
pub use lifecycle::{Lifecycle, TerminalCause};
pub use logger::{Attr, LogLogger, Logger, NoopLogger};
pub use shutdown::{CleanupOutcome, Shutdown, TerminationNotifier};
pub use signal::{Signal, DEFAULT_SIGNALS};
