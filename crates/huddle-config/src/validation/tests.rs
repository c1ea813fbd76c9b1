//! Tests for the full validation pipeline.

use super::*;
use crate::schema::*;

#[test]
fn default_config_validates() {
    let config = HuddleConfig::default();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_blank_display_name() {
    let mut config = HuddleConfig::default();
    config.identity.display_name = "   ".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("identity.display_name"));
}

#[test]
fn catches_avatar_without_http_scheme() {
    let mut config = HuddleConfig::default();
    config.identity.avatar_url = Some("ftp://host/me.png".into());
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("identity.avatar_url"));
}

#[test]
fn catches_typing_decay_too_small() {
    let mut config = HuddleConfig::default();
    config.session.typing_decay_ms = 10;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("session.typing_decay_ms"));
}

#[test]
fn zero_grace_is_allowed() {
    let mut config = HuddleConfig::default();
    config.session.typing_grace_ms = 0;
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_notice_ttl_too_large() {
    let mut config = HuddleConfig::default();
    config.session.notice_ttl_ms = 120_000;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("session.notice_ttl_ms"));
}

#[test]
fn max_visible_only_checked_for_stack() {
    let mut config = HuddleConfig::default();
    config.session.max_visible_notices = 0;
    assert!(validate(&config).is_ok());

    config.session.notice_policy = NoticeMode::Stack;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("session.max_visible_notices"));
}

#[test]
fn catches_http_room_url() {
    let mut config = HuddleConfig::default();
    config.realtime.url = "http://localhost:3001/room".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("realtime.url"));
}

#[test]
fn accepts_secure_room_url() {
    let mut config = HuddleConfig::default();
    config.realtime.url = "wss://chat.example.com/room".into();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_bare_scheme() {
    let mut config = HuddleConfig::default();
    config.realtime.url = "ws://".into();
    assert!(validate(&config).is_err());
}

#[test]
fn catches_backoff_cap_below_base() {
    let mut config = HuddleConfig::default();
    config.realtime.reconnect_delay = 10;
    config.realtime.max_reconnect_delay = 5;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("is below realtime.reconnect_delay"));
}

#[test]
fn catches_zero_upload_limit() {
    let mut config = HuddleConfig::default();
    config.upload.max_bytes = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("upload.max_bytes"));
}

#[test]
fn collects_multiple_errors() {
    let mut config = HuddleConfig::default();
    config.session.notice_ttl_ms = 0;
    config.realtime.heartbeat_interval = 0;
    config.logging.level = String::new();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("session.notice_ttl_ms"));
    assert!(err.contains("realtime.heartbeat_interval"));
    assert!(err.contains("logging.level"));
    assert_eq!(err.matches("; ").count(), 2);
}
