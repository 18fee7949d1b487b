// SPDX-License-Identifier: MIT OR Apache-2.0

use graceful_shutdown::global;
use graceful_shutdown::NoopLogger;
use serial_test::serial;
use std::io;
use std::time::Duration;

#[test]
#[serial]
fn facade_forwards_configuration() {
    global::set_logger(NoopLogger);
    global::set_graceful_timeout(Duration::from_millis(1500));
    assert_eq!(global::global().graceful_timeout(), Duration::from_millis(1500));

    let before = global::global().cleanup_count();
    global::add_cleanup(|_ctx| async {});
    global::add_blocking_cleanup(|_ctx| {});
    assert_eq!(global::global().cleanup_count(), before + 2);
}

#[test]
#[serial]
fn facade_cancel_releases_waiters() {
    global::set_logger(NoopLogger);
    let waiter = std::thread::spawn(global::done_blocking);
    std::thread::sleep(Duration::from_millis(20));

    global::cancel_with(io::Error::new(io::ErrorKind::Other, "global stop"));
    global::cancel(None);

    let err = waiter.join().unwrap().unwrap_err();
    assert_eq!(err.to_string(), "global stop");
    assert!(global::global().is_terminated());
    assert_eq!(global::done_blocking().unwrap_err().to_string(), "global stop");
}
