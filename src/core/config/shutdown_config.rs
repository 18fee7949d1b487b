// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Shutdown Configuration
//!
//! Settings for the shutdown coordinator, resolved in layers (low to high):
//!
//! 1. **Rust defaults** - 5 second graceful timeout, SIGINT + SIGTERM
//! 2. **Config file** - TOML or YAML, chosen by file extension
//! 3. **Environment** - `SHUTDOWN_GRACEFUL_TIMEOUT_MS`, `SHUTDOWN_SIGNALS`
//!
//! ## Example
//!
//! ```toml
//! graceful_timeout_ms = 10000
//! signals = ["SIGINT", "SIGTERM", "SIGHUP"]
//! ```
//!
//! ```rust,ignore
//! let config = ShutdownConfig::from_file("shutdown.toml")?.apply_env_overrides()?;
//! let shutdown = Shutdown::with_config(&config);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{ShutdownError, ShutdownResult};
use crate::core::util::signal::{Signal, DEFAULT_SIGNALS};

/// Default cleanup time budget in milliseconds
pub const DEFAULT_GRACEFUL_TIMEOUT_MS: u64 = 5_000;

/// Environment variable overriding `graceful_timeout_ms`
pub const ENV_GRACEFUL_TIMEOUT_MS: &str = "SHUTDOWN_GRACEFUL_TIMEOUT_MS";

/// Environment variable overriding `signals` (comma separated)
pub const ENV_SIGNALS: &str = "SHUTDOWN_SIGNALS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShutdownConfig {
    /// Maximum time to wait for cleanup callbacks, in milliseconds
    pub graceful_timeout_ms: u64,
    /// Signals that request termination
    pub signals: Vec<Signal>,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout_ms: DEFAULT_GRACEFUL_TIMEOUT_MS,
            signals: DEFAULT_SIGNALS.to_vec(),
        }
    }
}

impl ShutdownConfig {
    #[inline]
    pub fn graceful_timeout(&self) -> Duration {
        Duration::from_millis(self.graceful_timeout_ms)
    }

    pub fn from_toml_str(content: &str) -> ShutdownResult<Self> {
        toml::from_str(content)
            .map_err(|e| ShutdownError::configuration(format!("Invalid TOML config: {}", e)))
    }

    pub fn from_yaml_str(content: &str) -> ShutdownResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| ShutdownError::configuration(format!("Invalid YAML config: {}", e)))
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file.
    pub fn from_file(path: impl AsRef<Path>) -> ShutdownResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "toml" => Self::from_toml_str(&content),
            "yaml" | "yml" => Self::from_yaml_str(&content),
            other => Err(ShutdownError::configuration(format!(
                "Unsupported config file extension '{}' for {}. Valid values: 'toml', 'yaml', 'yml'",
                other,
                path.display()
            ))),
        }
    }

    /// Overlay values from the process environment.
    pub fn apply_env_overrides(self) -> ShutdownResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary key lookup. Empty values are ignored.
    pub fn apply_overrides<F>(mut self, lookup: F) -> ShutdownResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_GRACEFUL_TIMEOUT_MS).filter(|v| !v.trim().is_empty()) {
            self.graceful_timeout_ms = raw.trim().parse::<u64>().map_err(|e| {
                ShutdownError::configuration_with_key(
                    format!("Invalid graceful timeout '{}': {}", raw, e),
                    ENV_GRACEFUL_TIMEOUT_MS,
                )
            })?;
        }
        if let Some(raw) = lookup(ENV_SIGNALS).filter(|v| !v.trim().is_empty()) {
            self.signals = raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse::<Signal>)
                .collect::<ShutdownResult<Vec<_>>>()?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ShutdownConfig::default();
        assert_eq!(config.graceful_timeout(), Duration::from_secs(5));
        assert_eq!(config.signals, vec![Signal::Interrupt, Signal::Terminate]);
    }

    #[test]
    fn test_from_toml() {
        let config = ShutdownConfig::from_toml_str(
            r#"
            graceful_timeout_ms = 1500
            signals = ["SIGTERM", "hup"]
            "#,
        )
        .unwrap();
        assert_eq!(config.graceful_timeout(), Duration::from_millis(1500));
        assert_eq!(config.signals, vec![Signal::Terminate, Signal::Hangup]);
    }

    #[test]
    fn test_from_toml_partial_uses_defaults() {
        let config = ShutdownConfig::from_toml_str("graceful_timeout_ms = 0").unwrap();
        assert_eq!(config.graceful_timeout(), Duration::ZERO);
        assert_eq!(config.signals, DEFAULT_SIGNALS.to_vec());
    }

    #[test]
    fn test_from_yaml() {
        let config =
            ShutdownConfig::from_yaml_str("graceful_timeout_ms: 250\nsignals: [SIGINT]\n").unwrap();
        assert_eq!(config.graceful_timeout_ms, 250);
        assert_eq!(config.signals, vec![Signal::Interrupt]);
    }

    #[test]
    fn test_invalid_signal_in_toml() {
        let err = ShutdownConfig::from_toml_str(r#"signals = ["SIGKILL"]"#).unwrap_err();
        assert!(matches!(err, ShutdownError::Configuration { .. }));
        assert!(err.to_string().contains("SIGKILL"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ShutdownConfig::from_toml_str("timeout = 3").unwrap_err();
        assert!(err.to_string().contains("Invalid TOML config"));
    }

    #[test]
    fn test_from_file_by_extension() {
        let mut toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(toml_file, "graceful_timeout_ms = 42").unwrap();
        let config = ShutdownConfig::from_file(toml_file.path()).unwrap();
        assert_eq!(config.graceful_timeout_ms, 42);

        let mut yaml_file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(yaml_file, "graceful_timeout_ms: 43").unwrap();
        let config = ShutdownConfig::from_file(yaml_file.path()).unwrap();
        assert_eq!(config.graceful_timeout_ms, 43);
    }

    #[test]
    fn test_from_file_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = ShutdownConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported config file extension 'ini'"));
    }

    #[test]
    fn test_from_missing_file() {
        let err = ShutdownConfig::from_file("/nonexistent/shutdown.toml").unwrap_err();
        assert!(matches!(err, ShutdownError::IoError(_)));
    }

    #[test]
    fn test_overrides() {
        let config = ShutdownConfig::default()
            .apply_overrides(lookup(&[
                (ENV_GRACEFUL_TIMEOUT_MS, "750"),
                (ENV_SIGNALS, "SIGTERM, SIGQUIT"),
            ]))
            .unwrap();
        assert_eq!(config.graceful_timeout_ms, 750);
        assert_eq!(config.signals, vec![Signal::Terminate, Signal::Quit]);
    }

    #[test]
    fn test_empty_overrides_ignored() {
        let config = ShutdownConfig::default()
            .apply_overrides(lookup(&[(ENV_GRACEFUL_TIMEOUT_MS, " "), (ENV_SIGNALS, "")]))
            .unwrap();
        assert_eq!(config, ShutdownConfig::default());
    }

    #[test]
    fn test_invalid_timeout_override() {
        let err = ShutdownConfig::default()
            .apply_overrides(lookup(&[(ENV_GRACEFUL_TIMEOUT_MS, "-5")]))
            .unwrap_err();
        match err {
            ShutdownError::Configuration { config_key, .. } => {
                assert_eq!(config_key.as_deref(), Some(ENV_GRACEFUL_TIMEOUT_MS))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
