// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivers a real SIGTERM to the test process. Lives in its own test binary so
//! no other test shares the process while the signal is in flight.

#![cfg(unix)]

use graceful_shutdown::{Attr, Logger, Shutdown, ShutdownConfig, Signal};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Lines(Mutex<Vec<String>>);

impl Logger for Lines {
    fn info(&self, msg: &str, attrs: &[Attr<'_>]) {
        let mut line = msg.to_string();
        for (k, v) in attrs {
            line.push_str(&format!(" {}={}", k, v));
        }
        self.0.lock().unwrap().push(line);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sigterm_triggers_clean_shutdown() {
    let shutdown = Shutdown::with_config(&ShutdownConfig {
        graceful_timeout_ms: 1000,
        signals: vec![Signal::Terminate],
    });
    let lines = Arc::new(Lines::default());
    shutdown.set_logger_arc(lines.clone());
    shutdown.listen().unwrap();

    let rc = unsafe { libc::kill(libc::getpid(), libc::SIGTERM) };
    assert_eq!(rc, 0, "kill(SIGTERM) failed: {}", std::io::Error::last_os_error());

    tokio::time::timeout(Duration::from_secs(5), shutdown.done())
        .await
        .expect("shutdown after SIGTERM")
        .expect("clean cause");

    let lines = lines.0.lock().unwrap();
    assert!(lines.iter().any(|l| l == "Shutdown listen signals=[SIGTERM]"));
    assert!(lines.iter().any(|l| l == "Shutdown signal received signal=SIGTERM"));
    assert!(lines.iter().any(|l| l == "Shutdown no cleanup callbacks"));
}
