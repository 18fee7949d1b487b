// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shutdown Coordinator Error Types
//!
//! Operational failures of the coordinator itself. The terminal cause handed to
//! `Shutdown::cancel` is not one of these: it belongs to the caller and is
//! delivered verbatim to every waiter as a [`Cause`].

use std::sync::Arc;
use thiserror::Error;

use crate::core::util::signal::Signal;

/// Terminal cause recorded when the lifecycle ends abnormally.
///
/// Shared behind an `Arc` so every waiter observes the identical error value.
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for coordinator operations
pub type ShutdownResult<T> = Result<T, ShutdownError>;

#[derive(Error, Debug)]
pub enum ShutdownError {
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        config_key: Option<String>,
    },

    #[error("Failed to install handler for {signal}: {source}")]
    SignalInstall {
        signal: Signal,
        #[source]
        source: std::io::Error,
    },

    #[error("No tokio runtime available: listen() must be called from within a runtime")]
    NoRuntime,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ShutdownError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            config_key: None,
        }
    }

    /// Create a configuration error with a specific key
    pub fn configuration_with_key(message: impl Into<String>, config_key: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            config_key: Some(config_key.into()),
        }
    }

    pub fn signal_install(signal: Signal, source: std::io::Error) -> Self {
        Self::SignalInstall { signal, source }
    }
}

/// Wrap any error into a shareable [`Cause`].
pub fn cause<E>(err: E) -> Cause
where
    E: std::error::Error + Send + Sync + 'static,
{
    Arc::new(err)
}
