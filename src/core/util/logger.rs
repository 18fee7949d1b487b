// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logging capability used by the shutdown coordinator.
//!
//! The coordinator only records informational events. The default
//! implementation forwards them to the `log` facade so whatever logger the
//! binary installs (usually `env_logger`) picks them up.

use std::fmt::{self, Display, Write as _};

/// Log target used by [`LogLogger`]
pub const LOG_TARGET: &str = "graceful_shutdown";

/// Key/value attribute attached to a log event
pub type Attr<'a> = (&'a str, &'a dyn Display);

/// Capability for recording informational events.
///
/// Implementations must not panic; a failing sink should drop the event.
pub trait Logger: Send + Sync {
    fn info(&self, msg: &str, attrs: &[Attr<'_>]);
}

/// Forwards events to `log::info!`, rendering attributes as `key=value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLogger;

impl Logger for LogLogger {
    fn info(&self, msg: &str, attrs: &[Attr<'_>]) {
        log::info!(target: LOG_TARGET, "{}", render(msg, attrs));
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn info(&self, _msg: &str, _attrs: &[Attr<'_>]) {}
}

/// Render a message followed by its attributes: `msg key=value key2=value2`.
pub fn render(msg: &str, attrs: &[Attr<'_>]) -> String {
    let mut line = String::from(msg);
    for (key, value) in attrs {
        // Writing into a String cannot fail
        let _ = write!(line, " {}={}", key, value);
    }
    line
}

/// Display adapter for a list of values, rendered as `[a, b, c]`.
pub struct DisplayList<'a, T: Display>(pub &'a [T]);

impl<T: Display> Display for DisplayList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", item)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Logger capturing rendered lines for assertions
    #[derive(Default)]
    pub(crate) struct RecordingLogger {
        pub(crate) lines: Mutex<Vec<String>>,
    }

    impl RecordingLogger {
        pub(crate) fn contains(&self, needle: &str) -> bool {
            self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
        }
    }

    impl Logger for RecordingLogger {
        fn info(&self, msg: &str, attrs: &[Attr<'_>]) {
            self.lines.lock().unwrap().push(render(msg, attrs));
        }
    }

    #[test]
    fn test_render_without_attrs() {
        assert_eq!(render("Shutdown listen", &[]), "Shutdown listen");
    }

    #[test]
    fn test_render_with_attrs() {
        let callbacks = 2;
        let line = render("cleanup completed", &[("callbacks", &callbacks), ("outcome", &"ok")]);
        assert_eq!(line, "cleanup completed callbacks=2 outcome=ok");
    }

    #[test]
    fn test_display_list() {
        let items = ["SIGINT", "SIGTERM"];
        assert_eq!(DisplayList(&items).to_string(), "[SIGINT, SIGTERM]");
        let empty: [u8; 0] = [];
        assert_eq!(DisplayList(&empty).to_string(), "[]");
    }

    #[test]
    fn test_recording_logger() {
        let logger = RecordingLogger::default();
        logger.info("hello", &[("who", &"world")]);
        assert!(logger.contains("hello who=world"));
        NoopLogger.info("dropped", &[]);
        LogLogger.info("forwarded", &[]);
    }
}
