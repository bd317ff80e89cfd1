//! Process-wide logger lifecycle
//!
//! Kept in its own test binary with a single test: the logger is built once
//! per process, so the steps must run in order.

use rust_leveled_logger::{init_logger, is_initialized, logger, try_logger, LoggerError, Options};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_init_once_lifecycle() {
    // Use before initialization is rejected
    assert!(!is_initialized());
    assert!(try_logger().is_none());
    assert!(matches!(logger(), Err(LoggerError::NotInitialized)));

    // A failed build leaves the logger uninitialized
    let scratch = TempDir::new().expect("Failed to create temp dir");
    let blocker = scratch.path().join("plain-file");
    fs::write(&blocker, b"not a directory").unwrap();
    assert!(init_logger(Some(Options::new().with_directory(&blocker))).is_err());
    assert!(!is_initialized());

    let first_dir = TempDir::new().expect("Failed to create temp dir");
    let first = init_logger(Some(
        Options::new()
            .with_directory(first_dir.path())
            .with_app_name("first")
            .with_level("debug"),
    ))
    .expect("Failed to initialize logger");
    let resolved = first.config().clone();

    let second_dir = TempDir::new().expect("Failed to create temp dir");
    let second = init_logger(Some(
        Options::new()
            .with_directory(second_dir.path())
            .with_app_name("second")
            .with_level("error"),
    ))
    .expect("Second call should return the existing logger");

    assert!(std::ptr::eq(first, second));
    assert_eq!(second.config(), &resolved);
    assert!(std::ptr::eq(logger().unwrap(), first));
    assert!(is_initialized());

    // Both calls left a notice in the first logger's info file
    first.flush().unwrap();
    let info = fs::read_to_string(first_dir.path().join("first-info.log")).unwrap();
    assert!(info.contains("[init_logger] logger initialized"));
    assert!(info.contains("[init_logger] logger already initialized"));
    assert!(fs::read_dir(second_dir.path()).unwrap().next().is_none());

    // None falls back to the existing logger as well
    let third = init_logger(None).unwrap();
    assert!(std::ptr::eq(third, first));
}
