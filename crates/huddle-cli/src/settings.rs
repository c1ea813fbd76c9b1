//! Turn the file config plus command-line overrides into the types the
//! session core takes.

use std::time::Duration;

use huddle_config::schema::{IdentityConfig, RealtimeSection, SessionConfig, UploadSection};
use huddle_config::{HuddleConfig, NoticeMode};
use huddle_sync::{LocalIdentity, NoticePolicy, RealtimeConfig, SessionTimings, UploadConfig};

use crate::cli::Args;

/// Everything needed to open a session.
#[derive(Debug, Clone)]
pub struct Settings {
    pub identity: LocalIdentity,
    pub timings: SessionTimings,
    pub realtime: RealtimeConfig,
    pub upload: UploadConfig,
    pub log_directive: String,
}

impl Settings {
    /// Command-line flags win over the file.
    pub fn resolve(config: &HuddleConfig, args: &Args) -> Self {
        let mut realtime = realtime_config(&config.realtime);
        if let Some(url) = &args.url {
            realtime.url = url.clone();
        }
        Self {
            identity: identity(&config.identity, args),
            timings: session_timings(&config.session),
            realtime,
            upload: upload_config(&config.upload),
            log_directive: args
                .log_level
                .clone()
                .unwrap_or_else(|| config.logging.level.clone()),
        }
    }
}

fn identity(config: &IdentityConfig, args: &Args) -> LocalIdentity {
    let name = args
        .name
        .as_deref()
        .unwrap_or(&config.display_name)
        .trim()
        .to_string();
    let user_id = args.user_id.as_deref().unwrap_or(&config.user_id).trim();

    let identity = if user_id.is_empty() {
        LocalIdentity::generate(&name)
    } else {
        LocalIdentity::new(user_id, name)
    };
    match &config.avatar_url {
        Some(url) => identity.with_avatar(url.clone()),
        None => identity,
    }
}

pub fn session_timings(config: &SessionConfig) -> SessionTimings {
    SessionTimings {
        typing_decay: Duration::from_millis(config.typing_decay_ms.into()),
        typing_grace: Duration::from_millis(config.typing_grace_ms.into()),
        notice_ttl: Duration::from_millis(config.notice_ttl_ms.into()),
        notice_policy: match config.notice_policy {
            NoticeMode::Single => NoticePolicy::Single,
            NoticeMode::Stack => NoticePolicy::Stack {
                max_visible: config.max_visible_notices.max(1) as usize,
            },
        },
    }
}

pub fn realtime_config(config: &RealtimeSection) -> RealtimeConfig {
    RealtimeConfig {
        url: config.url.clone(),
        heartbeat_interval_secs: config.heartbeat_interval.into(),
        reconnect_delay_secs: config.reconnect_delay.into(),
        max_reconnect_delay_secs: config.max_reconnect_delay.into(),
        connect_timeout_secs: config.connect_timeout.into(),
    }
}

pub fn upload_config(config: &UploadSection) -> UploadConfig {
    UploadConfig {
        endpoint: config.endpoint.clone(),
        max_bytes: config.max_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["huddle"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_match_session_core() {
        let settings = Settings::resolve(&HuddleConfig::default(), &args(&[]));
        let core = SessionTimings::default();
        assert_eq!(settings.timings.typing_decay, core.typing_decay);
        assert_eq!(settings.timings.typing_grace, core.typing_grace);
        assert_eq!(settings.timings.notice_ttl, core.notice_ttl);
        assert_eq!(settings.timings.notice_policy, NoticePolicy::Single);
        assert_eq!(settings.realtime.url, RealtimeConfig::default().url);
        assert_eq!(settings.log_directive, "huddle=info");
    }

    #[test]
    fn flags_override_file() {
        let mut config = HuddleConfig::default();
        config.identity.display_name = "FromFile".into();
        config.identity.user_id = "file-id".into();

        let settings = Settings::resolve(
            &config,
            &args(&[
                "--name",
                "Ana",
                "--user-id",
                "u-ana",
                "--url",
                "wss://chat.example.com/room",
                "--log-level",
                "debug",
            ]),
        );
        assert_eq!(settings.identity.display_name, "Ana");
        assert_eq!(settings.identity.user_id, "u-ana");
        assert_eq!(settings.realtime.url, "wss://chat.example.com/room");
        assert_eq!(settings.log_directive, "debug");
    }

    #[test]
    fn empty_user_id_generates_one() {
        let settings = Settings::resolve(&HuddleConfig::default(), &args(&[]));
        assert!(!settings.identity.user_id.is_empty());
        assert_eq!(settings.identity.display_name, "Guest");
    }

    #[test]
    fn avatar_carries_over() {
        let mut config = HuddleConfig::default();
        config.identity.avatar_url = Some("https://example.com/a.png".into());
        let settings = Settings::resolve(&config, &args(&[]));
        assert_eq!(
            settings.identity.avatar_url.as_deref(),
            Some("https://example.com/a.png")
        );
    }

    #[test]
    fn stack_policy_maps_visible_limit() {
        let config = SessionConfig {
            notice_policy: NoticeMode::Stack,
            max_visible_notices: 4,
            ..SessionConfig::default()
        };
        assert_eq!(
            session_timings(&config).notice_policy,
            NoticePolicy::Stack { max_visible: 4 }
        );
    }

    #[test]
    fn realtime_durations_carry_over() {
        let section = RealtimeSection {
            heartbeat_interval: 10,
            reconnect_delay: 2,
            max_reconnect_delay: 60,
            connect_timeout: 5,
            ..RealtimeSection::default()
        };
        let rt = realtime_config(&section);
        assert_eq!(rt.heartbeat_interval_secs, 10);
        assert_eq!(rt.reconnect_delay_secs, 2);
        assert_eq!(rt.max_reconnect_delay_secs, 60);
        assert_eq!(rt.connect_timeout_secs, 5);
    }
}
