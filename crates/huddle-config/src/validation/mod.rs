//! Full configuration validation.
//!
//! Each section has its own validator; `validate` runs them all and
//! collects every error into a single `ConfigError`.

mod helpers;

#[cfg(test)]
mod tests;

use huddle_common::ConfigError;

use self::helpers::{validate_not_blank, validate_range, validate_url};
use crate::schema::{HuddleConfig, NoticeMode};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &HuddleConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_identity(&mut errors, config);
    validate_session(&mut errors, config);
    validate_realtime(&mut errors, config);
    validate_upload(&mut errors, config);
    validate_not_blank(&mut errors, "logging.level", &config.logging.level);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_identity(errors: &mut Vec<String>, config: &HuddleConfig) {
    validate_not_blank(errors, "identity.display_name", &config.identity.display_name);
    if let Some(avatar) = &config.identity.avatar_url {
        validate_url(errors, "identity.avatar_url", avatar, &["http://", "https://"]);
    }
}

fn validate_session(errors: &mut Vec<String>, config: &HuddleConfig) {
    let session = &config.session;
    validate_range(errors, "session.typing_decay_ms", session.typing_decay_ms, 250, 30_000);
    validate_range(errors, "session.typing_grace_ms", session.typing_grace_ms, 0, 10_000);
    validate_range(errors, "session.notice_ttl_ms", session.notice_ttl_ms, 500, 60_000);
    if session.notice_policy == NoticeMode::Stack {
        validate_range(
            errors,
            "session.max_visible_notices",
            session.max_visible_notices,
            1,
            20,
        );
    }
}

fn validate_realtime(errors: &mut Vec<String>, config: &HuddleConfig) {
    let rt = &config.realtime;
    validate_url(errors, "realtime.url", &rt.url, &["ws://", "wss://"]);
    validate_range(errors, "realtime.heartbeat_interval", rt.heartbeat_interval, 5, 300);
    validate_range(errors, "realtime.reconnect_delay", rt.reconnect_delay, 1, 60);
    validate_range(
        errors,
        "realtime.max_reconnect_delay",
        rt.max_reconnect_delay,
        1,
        600,
    );
    validate_range(errors, "realtime.connect_timeout", rt.connect_timeout, 1, 120);
    if rt.max_reconnect_delay < rt.reconnect_delay {
        errors.push(format!(
            "realtime.max_reconnect_delay = {} is below realtime.reconnect_delay = {}",
            rt.max_reconnect_delay, rt.reconnect_delay
        ));
    }
}

fn validate_upload(errors: &mut Vec<String>, config: &HuddleConfig) {
    validate_url(
        errors,
        "upload.endpoint",
        &config.upload.endpoint,
        &["http://", "https://"],
    );
    if config.upload.max_bytes == 0 {
        errors.push("upload.max_bytes must be greater than 0".to_string());
    }
}
