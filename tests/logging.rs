use std::{fs, thread::sleep, time::Duration};

use serial_test::serial;
use tempfile::tempdir;

// The global subscriber can only be installed once per test binary, so the
// file check and the repeat call share one test.
#[test]
#[serial]
fn writes_log_file_in_nested_dir() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logs").join("quick_panel.log");

    let guard = quick_panel::logging::init(true, Some(path.clone()));
    assert!(guard.is_some(), "file writer guard should be returned");
    tracing::info!("panel test line");

    sleep(Duration::from_millis(100));
    drop(guard);

    assert!(path.exists(), "log file was not created");
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("panel test line"));

    let other = dir.path().join("other.log");
    assert!(quick_panel::logging::init(false, None).is_none());
    tracing::info!("second");
    sleep(Duration::from_millis(50));
    assert!(!other.exists(), "log file should not be created");
}

#[test]
fn debug_flag_is_read_from_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    assert!(!quick_panel::logging::debug_flag(&path));

    fs::write(&path, r#"{"debug_logging": true, "actions": []}"#).unwrap();
    assert!(quick_panel::logging::debug_flag(&path));

    fs::write(&path, r#"{"debug_logging": false}"#).unwrap();
    assert!(!quick_panel::logging::debug_flag(&path));

    fs::write(&path, "{ not json").unwrap();
    assert!(!quick_panel::logging::debug_flag(&path));
}
