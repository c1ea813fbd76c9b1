//! Tests for the presence registry.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;

use super::*;
use crate::debounce::{Expiry, TimerKey};
use crate::protocol::RosterEntry;

const GRACE: Duration = Duration::from_millis(1000);

fn registry() -> (PresenceRegistry, mpsc::UnboundedReceiver<Expiry<TimerKey>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (PresenceRegistry::new("me", GRACE, tx), rx)
}

fn entry(user_id: &str, name: &str) -> RosterEntry {
    RosterEntry {
        user_id: user_id.into(),
        display_name: name.into(),
        avatar_url: None,
    }
}

async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn roster_excludes_local_user() {
    let (mut reg, _rx) = registry();
    reg.set_roster(vec![entry("me", "Me"), entry("u1", "Ana"), entry("u2", "Bo")]);
    assert_eq!(reg.online_count(), 2);
    assert!(reg.get("me").is_none());
    let names: Vec<_> = reg.participants().iter().map(|p| p.display_name.as_str()).collect();
    assert_eq!(names, ["Ana", "Bo"]);
}

#[tokio::test]
async fn roster_is_replaced_not_merged() {
    let (mut reg, _rx) = registry();
    reg.set_roster(vec![entry("u1", "Ana"), entry("u2", "Bo")]);
    reg.set_roster(vec![entry("u3", "Cy")]);
    assert_eq!(reg.online_count(), 1);
    assert!(reg.get("u1").is_none());
    assert!(reg.get("u3").is_some());
}

#[tokio::test]
async fn roster_keeps_typing_flag_of_retained_users() {
    let (mut reg, _rx) = registry();
    reg.set_roster(vec![entry("u1", "Ana"), entry("u2", "Bo")]);
    reg.apply_typing("u1", "Ana", true);
    reg.apply_typing("u2", "Bo", true);
    reg.apply_typing("u2", "Bo", false);
    assert_eq!(reg.pending_timers(), 1);

    reg.set_roster(vec![entry("u1", "Ana")]);
    assert!(reg.is_typing("u1"));
    assert_eq!(reg.pending_timers(), 0);
}

#[tokio::test]
async fn typing_true_is_immediate_and_idempotent() {
    let (mut reg, _rx) = registry();
    assert!(reg.apply_typing("u1", "Ana", true));
    assert!(reg.is_typing("u1"));
    assert!(!reg.apply_typing("u1", "Ana", true));
    assert_eq!(reg.online_count(), 1);
}

#[tokio::test]
async fn local_typing_echo_is_ignored() {
    let (mut reg, _rx) = registry();
    assert!(!reg.apply_typing("me", "Me", true));
    assert_eq!(reg.online_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn typing_false_clears_after_grace_window() {
    let (mut reg, mut rx) = registry();
    reg.apply_typing("u1", "Ana", true);
    assert!(!reg.apply_typing("u1", "Ana", false));
    assert!(reg.is_typing("u1"));

    time::advance(Duration::from_millis(999)).await;
    settle().await;
    assert!(rx.try_recv().is_err());
    assert!(reg.is_typing("u1"));

    time::advance(Duration::from_millis(2)).await;
    let expiry = rx.recv().await.unwrap();
    assert!(reg.on_expiry(&expiry));
    assert!(!reg.is_typing("u1"));
}

#[tokio::test(start_paused = true)]
async fn stop_then_start_within_grace_keeps_typing() {
    let (mut reg, mut rx) = registry();
    reg.apply_typing("u1", "Ana", true);
    time::advance(Duration::from_millis(200)).await;
    reg.apply_typing("u1", "Ana", false);
    time::advance(Duration::from_millis(500)).await;
    reg.apply_typing("u1", "Ana", true);

    time::sleep(Duration::from_millis(3000)).await;
    settle().await;
    while let Ok(expiry) = rx.try_recv() {
        assert!(!reg.on_expiry(&expiry));
    }
    assert!(reg.is_typing("u1"));
}

#[tokio::test(start_paused = true)]
async fn repeated_stop_does_not_extend_grace() {
    let (mut reg, mut rx) = registry();
    reg.apply_typing("u1", "Ana", true);
    reg.apply_typing("u1", "Ana", false);
    time::advance(Duration::from_millis(600)).await;
    reg.apply_typing("u1", "Ana", false);

    time::advance(Duration::from_millis(401)).await;
    let expiry = rx.recv().await.unwrap();
    assert!(reg.on_expiry(&expiry));
    assert!(!reg.is_typing("u1"));
}

#[tokio::test]
async fn stop_for_non_typing_user_arms_nothing() {
    let (mut reg, _rx) = registry();
    reg.apply_typing("u1", "Ana", false);
    assert_eq!(reg.pending_timers(), 0);
    assert!(!reg.is_typing("u1"));
}

#[tokio::test]
async fn late_stop_after_leave_adds_no_one() {
    let (mut reg, _rx) = registry();
    reg.set_roster(vec![entry("u1", "Ana")]);
    assert!(reg.remove("u1").is_some());

    assert!(!reg.apply_typing("u1", "Ana", false));
    assert!(reg.get("u1").is_none());
    assert_eq!(reg.online_count(), 0);
    assert_eq!(reg.pending_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn remove_cancels_grace_timer() {
    let (mut reg, mut rx) = registry();
    reg.apply_typing("u1", "Ana", true);
    reg.apply_typing("u1", "Ana", false);
    let removed = reg.remove("u1").unwrap();
    assert_eq!(removed.display_name, "Ana");

    time::sleep(Duration::from_millis(2000)).await;
    settle().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn upsert_refreshes_name_and_avatar() {
    let (mut reg, _rx) = registry();
    assert!(reg.upsert("u1", "Ana", None));
    assert!(!reg.upsert("u1", "Ana", None));
    assert!(reg.upsert("u1", "Ana M.", Some("https://a/1.png".into())));
    let p = reg.get("u1").unwrap();
    assert_eq!(p.display_name, "Ana M.");
    assert_eq!(p.avatar_url.as_deref(), Some("https://a/1.png"));
    assert!(!reg.upsert("me", "Me", None));
}

#[tokio::test]
async fn typing_summary_wording() {
    let (mut reg, _rx) = registry();
    assert_eq!(reg.typing_summary(), None);

    reg.apply_typing("u1", "Ana", true);
    assert_eq!(reg.typing_summary().unwrap().to_string(), "Ana is typing...");

    reg.apply_typing("u2", "Bo", true);
    assert_eq!(
        reg.typing_summary().unwrap().to_string(),
        "Ana and Bo are typing..."
    );

    reg.apply_typing("u3", "Cy", true);
    assert_eq!(reg.typing_summary(), Some(TypingSummary::Several(3)));
    assert_eq!(
        reg.typing_summary().unwrap().to_string(),
        "Several people are typing..."
    );
}

#[tokio::test]
async fn online_label_pluralises() {
    let (mut reg, _rx) = registry();
    assert_eq!(reg.online_label(), "0 users online");
    reg.upsert("u1", "Ana", None);
    assert_eq!(reg.online_label(), "1 user online");
    reg.upsert("u2", "Bo", None);
    assert_eq!(reg.online_label(), "2 users online");
}

#[tokio::test]
async fn clear_typing_and_clear() {
    let (mut reg, _rx) = registry();
    reg.apply_typing("u1", "Ana", true);
    reg.apply_typing("u2", "Bo", true);
    reg.apply_typing("u2", "Bo", false);

    assert!(reg.clear_typing());
    assert!(!reg.is_typing("u1"));
    assert_eq!(reg.pending_timers(), 0);
    assert!(!reg.clear_typing());

    reg.clear();
    assert_eq!(reg.online_count(), 0);
}
