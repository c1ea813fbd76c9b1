//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use crate::schema::NoticeMode;
use huddle_common::ConfigError;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let err = load_from_path(Path::new("/tmp/nonexistent_huddle_config.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[identity]
display_name = "Ana"

[session]
notice_policy = "stack"
notice_ttl_ms = 8000
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.identity.display_name, "Ana");
    assert_eq!(config.session.notice_policy, NoticeMode::Stack);
    assert_eq!(config.session.notice_ttl_ms, 8000);
    // Defaults preserved
    assert_eq!(config.session.typing_decay_ms, 2000);
    assert_eq!(config.realtime.url, "ws://localhost:3001/room");
    assert_eq!(config.logging.level, "huddle=info");
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn unknown_notice_policy_is_a_parse_error() {
    let err = parse_toml("[session]\nnotice_policy = \"carousel\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn out_of_range_values_are_kept_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[session]\nnotice_ttl_ms = 1\n").unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.session.notice_ttl_ms, 1);
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huddle").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.identity.display_name, "Guest");
    assert_eq!(config.session.notice_policy, NoticeMode::Single);
    assert!(crate::validation::validate(&config).is_ok());
}

#[test]
fn create_default_config_keeps_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[identity]\ndisplay_name = \"Bo\"\n").unwrap();

    create_default_config(&path).unwrap();
    let config = load_from_path(&path).unwrap();
    assert_eq!(config.identity.display_name, "Bo");
}

#[test]
fn load_or_create_writes_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let config = load_or_create(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.realtime.heartbeat_interval, 25);
}

#[test]
fn empty_file_yields_defaults() {
    let config = parse_toml("").unwrap();
    assert_eq!(config.upload.max_bytes, 10 * 1024 * 1024);
    assert_eq!(config.session.max_visible_notices, 3);
    assert!(config.identity.avatar_url.is_none());
}

#[test]
fn default_config_path_ends_with_huddle() {
    if std::env::var_os(CONFIG_PATH_ENV).is_some() {
        return;
    }
    let path = default_config_path().unwrap();
    assert!(path.ends_with("huddle/config.toml"));
}
