//! Local typing indicator.
//!
//! Turns a stream of keystrokes into at most one "started" signal per burst
//! and exactly one "stopped" signal when the burst ends, either by going
//! quiet for the decay window or by sending.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::debounce::{DebounceTimer, Expiry, TimerKey};

/// A change to broadcast to other participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    Started,
    Stopped,
}

impl TypingSignal {
    pub fn is_typing(self) -> bool {
        matches!(self, Self::Started)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComposeState {
    #[default]
    Idle,
    Composing,
}

pub struct TypingController {
    state: ComposeState,
    decay: Duration,
    timer: DebounceTimer<TimerKey>,
}

impl TypingController {
    pub fn new(decay: Duration, expiry_tx: mpsc::UnboundedSender<Expiry<TimerKey>>) -> Self {
        Self {
            state: ComposeState::Idle,
            decay,
            timer: DebounceTimer::new(expiry_tx),
        }
    }

    /// Register a keystroke. Returns `Started` only on the first keystroke of
    /// a burst; later ones just push the decay deadline back.
    pub fn on_keystroke(&mut self) -> Option<TypingSignal> {
        self.timer.schedule(TimerKey::TypingDecay, self.decay);
        match self.state {
            ComposeState::Idle => {
                self.state = ComposeState::Composing;
                debug!("Composing started");
                Some(TypingSignal::Started)
            }
            ComposeState::Composing => None,
        }
    }

    /// Handle an elapsed decay timer.
    pub fn on_expiry(&mut self, expiry: &Expiry<TimerKey>) -> Option<TypingSignal> {
        if expiry.key != TimerKey::TypingDecay || !self.timer.accept(expiry) {
            return None;
        }
        match self.state {
            ComposeState::Composing => {
                self.state = ComposeState::Idle;
                debug!("Composing decayed");
                Some(TypingSignal::Stopped)
            }
            ComposeState::Idle => None,
        }
    }

    /// A message went out: stop typing now, whatever the state.
    pub fn on_send(&mut self) -> TypingSignal {
        self.timer.cancel(&TimerKey::TypingDecay);
        self.state = ComposeState::Idle;
        TypingSignal::Stopped
    }

    /// Go idle without signalling anyone.
    pub fn reset(&mut self) {
        self.timer.cancel_all();
        self.state = ComposeState::Idle;
    }

    pub fn state(&self) -> ComposeState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time;

    const DECAY: Duration = Duration::from_millis(2000);

    fn controller() -> (TypingController, mpsc::UnboundedReceiver<Expiry<TimerKey>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TypingController::new(DECAY, tx), rx)
    }

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    /// Feed every pending expiry to the controller and collect the signals.
    fn drain(
        c: &mut TypingController,
        rx: &mut mpsc::UnboundedReceiver<Expiry<TimerKey>>,
    ) -> Vec<TypingSignal> {
        let mut signals = Vec::new();
        while let Ok(expiry) = rx.try_recv() {
            signals.extend(c.on_expiry(&expiry));
        }
        signals
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_keystrokes_starts_once() {
        let (mut c, mut rx) = controller();
        let mut signals = Vec::new();
        for _ in 0..10 {
            signals.extend(c.on_keystroke());
            time::advance(Duration::from_millis(150)).await;
            settle().await;
            signals.extend(drain(&mut c, &mut rx));
        }
        assert_eq!(signals, [TypingSignal::Started]);
        assert_eq!(c.state(), ComposeState::Composing);
    }

    #[tokio::test(start_paused = true)]
    async fn silence_stops_exactly_once() {
        let (mut c, mut rx) = controller();
        c.on_keystroke();
        time::advance(Duration::from_millis(1000)).await;
        c.on_keystroke();

        time::advance(Duration::from_millis(1999)).await;
        settle().await;
        assert!(drain(&mut c, &mut rx).is_empty());

        time::advance(Duration::from_millis(2)).await;
        let expiry = rx.recv().await.unwrap();
        assert_eq!(c.on_expiry(&expiry), Some(TypingSignal::Stopped));
        assert_eq!(c.state(), ComposeState::Idle);

        time::sleep(Duration::from_millis(5000)).await;
        settle().await;
        assert!(drain(&mut c, &mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn send_stops_immediately_and_silences_decay() {
        let (mut c, mut rx) = controller();
        c.on_keystroke();
        time::advance(Duration::from_millis(500)).await;
        assert_eq!(c.on_send(), TypingSignal::Stopped);
        assert_eq!(c.state(), ComposeState::Idle);

        time::sleep(Duration::from_millis(5000)).await;
        settle().await;
        assert!(drain(&mut c, &mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn typing_after_send_starts_a_new_burst() {
        let (mut c, _rx) = controller();
        c.on_keystroke();
        c.on_send();
        assert_eq!(c.on_keystroke(), Some(TypingSignal::Started));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_goes_idle_silently() {
        let (mut c, mut rx) = controller();
        c.on_keystroke();
        c.reset();
        assert_eq!(c.state(), ComposeState::Idle);

        time::sleep(Duration::from_millis(5000)).await;
        settle().await;
        assert!(drain(&mut c, &mut rx).is_empty());
    }

    #[tokio::test]
    async fn foreign_expiries_are_ignored() {
        let (mut c, _rx) = controller();
        c.on_keystroke();

        let (probe_tx, mut probe_rx) = mpsc::unbounded_channel();
        let mut probe = DebounceTimer::new(probe_tx);
        probe.schedule(TimerKey::NoticeExpiry("n".into()), Duration::ZERO);
        let expiry = probe_rx.recv().await.unwrap();
        assert_eq!(c.on_expiry(&expiry), None);
        assert_eq!(c.state(), ComposeState::Composing);
    }

    #[test]
    fn signal_maps_to_flag() {
        assert!(TypingSignal::Started.is_typing());
        assert!(!TypingSignal::Stopped.is_typing());
    }
}
