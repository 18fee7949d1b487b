// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod shutdown_config;

pub use shutdown_config::{
    ShutdownConfig, DEFAULT_GRACEFUL_TIMEOUT_MS, ENV_GRACEFUL_TIMEOUT_MS, ENV_SIGNALS,
};
