//! Tests for error types

use study_tracker::Error;

#[test]
fn test_quota_exceeded_error() {
    let error = Error::QuotaExceeded {
        needed: 5_300_000,
        limit: 5_242_880,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("quota exceeded"));
    assert!(error_str.contains("5300000"));
    assert!(error_str.contains("5242880"));
}

#[test]
fn test_local_storage_error() {
    let error = Error::LocalStorage("disk unavailable".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Local storage error"));
    assert!(error_str.contains("disk unavailable"));
}

#[test]
fn test_remote_init_error() {
    let error = Error::RemoteInit("sdk not loaded".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Remote initialization failed"));
    assert!(error_str.contains("local storage only"));
}

#[test]
fn test_remote_operation_error() {
    let error = Error::RemoteOperation("permission denied".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Remote operation failed"));
    assert!(error_str.contains("permission denied"));
}

#[test]
fn test_queue_closed_error() {
    let error = Error::QueueClosed;
    let error_str = format!("{error}");
    assert!(error_str.contains("mirror queue closed"));
}

#[test]
fn test_nothing_to_export_error() {
    assert_eq!(Error::NothingToExport.to_string(), "No data to export");
}

#[test]
fn test_config_error() {
    let error = Error::Config("missing databaseURL".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Configuration error"));
    assert!(error_str.contains("databaseURL"));
}

#[test]
fn test_serialization_error_from_serde_json() {
    let json_err = serde_json::from_str::<serde_json::Value>("[1,").unwrap_err();
    let error: Error = json_err.into();
    assert!(matches!(error, Error::Serialization(_)));
    assert!(format!("{error}").contains("Serialization error"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
    assert!(error_str.contains("file not found"));
}

#[test]
fn test_error_debug_format() {
    let error = Error::LocalStorage("debug test".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("LocalStorage"));
}
