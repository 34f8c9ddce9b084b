//! Configuration storage round-trips through a temporary directory.

use b15f::config::{self, ToolConfig};
use b15f::B15FError;
use std::fs;

#[test]
fn test_missing_file_is_created_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("b15f").join("config.toml");

    let config = config::load_from(&path).unwrap();

    assert_eq!(config, ToolConfig::default());
    assert!(path.exists());
}

#[test]
fn test_round_trip_preserves_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let config = ToolConfig {
        default_port: Some("/dev/ttyUSB3".to_string()),
        probe_timeout_ms: 250,
    };

    config::save_to(&path, &config).unwrap();
    let loaded = config::load_from(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "default_port = \"/dev/ttyACM0\"\n").unwrap();

    let config = config::load_from(&path).unwrap();

    assert_eq!(config.default_port.as_deref(), Some("/dev/ttyACM0"));
    assert_eq!(config.probe_timeout_ms, 5000);
}

#[test]
fn test_invalid_toml_is_an_error_and_file_survives() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "default_port = [not toml").unwrap();

    let err = config::load_from(&path).unwrap_err();

    assert!(matches!(err, B15FError::TomlDeserialize(_)));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "default_port = [not toml"
    );
}

#[test]
fn test_loaded_config_is_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "probe_timeout_ms = 0\n").unwrap();

    let err = config::load_from(&path).unwrap_err();

    assert!(matches!(err, B15FError::Config(_)));
}

#[test]
fn test_save_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let config = ToolConfig {
        default_port: Some(String::new()),
        probe_timeout_ms: 5000,
    };

    assert!(config::save_to(&path, &config).is_err());
    assert!(!path.exists());
}
