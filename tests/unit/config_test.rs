//! Tests for configuration validation

use ems::config::{EmsConfig, DEFAULT_ACCESS_DELAY_MS};

#[test]
fn test_config_validation() {
    let valid = EmsConfig {
        access_delay_ms: 0,
        max_proc: 2,
        max_threads: 4,
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_config_invalid_max_proc() {
    let invalid = EmsConfig::new().with_max_proc(0);
    assert_eq!(
        invalid.validate().unwrap_err(),
        "max_proc must be greater than 0"
    );
}

#[test]
fn test_config_invalid_max_threads() {
    let invalid = EmsConfig::new().with_max_proc(1).with_max_threads(0);
    assert_eq!(
        invalid.validate().unwrap_err(),
        "max_threads must be greater than 0"
    );
}

#[test]
fn test_config_from_json() {
    let json = r#"{ "access_delay_ms": 0, "max_proc": 3, "max_threads": 2 }"#;
    let cfg = EmsConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.access_delay_ms, 0);
    assert_eq!(cfg.max_proc, 3);
    assert_eq!(cfg.max_threads, 2);
}

#[test]
fn test_config_from_json_rejects_zero_threads() {
    let json = r#"{ "max_threads": 0 }"#;
    assert!(EmsConfig::from_json_str(json).is_err());
}

#[test]
fn test_config_from_json_rejects_garbage() {
    let err = EmsConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_config_json_roundtrip_keeps_default_delay() {
    let cfg = EmsConfig::new().with_max_threads(2);
    let json = serde_json::to_string(&cfg).unwrap();
    let parsed = EmsConfig::from_json_str(&json).unwrap();
    assert_eq!(parsed, cfg);
    assert_eq!(parsed.access_delay_ms, DEFAULT_ACCESS_DELAY_MS);
}
