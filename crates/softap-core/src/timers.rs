// ── TimerSet ──
//
// Tasks that race a `sleep` against a `CancellationToken` and post their
// event back into the dispatcher's mailbox on fire — a spawn-a-task,
// race-a-token shape, collapsed from a repeating `interval` to a single
// `sleep` since these are one-shot.

use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::event::Event;

#[derive(Debug, Default)]
pub struct TimerSet {
    shutdown: Option<CancellationToken>,
    bridged_idle: Option<CancellationToken>,
    /// Idempotence flag from prevents re-arming
    /// `BridgedIdleTimer` while it is already armed.
    bridged_idle_active: bool,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shutdown_armed(&self) -> bool {
        self.shutdown.is_some()
    }

    pub fn bridged_idle_armed(&self) -> bool {
        self.bridged_idle_active
    }

    /// Arm `ShutdownTimer`. Cancels any previously-armed instance first —
    /// callers are expected to only call this when I4's precondition holds.
    pub fn arm_shutdown(&mut self, delay_ms: u64, mailbox: mpsc::UnboundedSender<Event>) {
        self.cancel_shutdown();
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(Duration::from_millis(delay_ms)) => {
                    trace!("ShutdownTimer fired");
                    let _ = mailbox.send(Event::NoClientsTimeout);
                }
                () = child.cancelled() => {
                    trace!("ShutdownTimer cancelled");
                }
            }
        });
        self.shutdown = Some(token);
    }

    pub fn cancel_shutdown(&mut self) {
        if let Some(token) = self.shutdown.take() {
            token.cancel();
        }
    }

    /// Arm `BridgedIdleTimer`. A no-op if already armed.
    pub fn arm_bridged_idle(&mut self, delay_ms: u64, mailbox: mpsc::UnboundedSender<Event>) {
        if self.bridged_idle_active {
            return;
        }
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(Duration::from_millis(delay_ms)) => {
                    trace!("BridgedIdleTimer fired");
                    let _ = mailbox.send(Event::NoClientsTimeoutOneInstance);
                }
                () = child.cancelled() => {
                    trace!("BridgedIdleTimer cancelled");
                }
            }
        });
        self.bridged_idle = Some(token);
        self.bridged_idle_active = true;
    }

    pub fn cancel_bridged_idle(&mut self) {
        if let Some(token) = self.bridged_idle.take() {
            token.cancel();
        }
        self.bridged_idle_active = false;
    }

    /// Clears the idempotence flag after `NoClientsTimeoutOneInstance` has
    /// actually been delivered — the spawned task has already run to
    /// completion at that point, so there is nothing left to cancel, but
    /// `bridged_idle_active` must still drop so a later `reschedule_timers`
    /// can re-arm rather than seeing a stale "already armed" flag.
    pub fn acknowledge_bridged_idle_fired(&mut self) {
        self.bridged_idle = None;
        self.bridged_idle_active = false;
    }

    /// Cancel both timers — called on exit from `Running`.
    pub fn cancel_all(&mut self) {
        self.cancel_shutdown();
        self.cancel_bridged_idle();
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    #[tokio::test(start_paused = true)]
    async fn shutdown_timer_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = TimerSet::new();
        timers.arm_shutdown(1000, tx);
        assert!(timers.shutdown_armed());

        tokio::time::advance(StdDuration::from_millis(1001)).await;
        let event = rx.recv().await.unwrap();
        assert_eq!(event, Event::NoClientsTimeout);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_shutdown_suppresses_fire() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = TimerSet::new();
        timers.arm_shutdown(1000, tx);
        timers.cancel_shutdown();
        assert!(!timers.shutdown_armed());

        tokio::time::advance(StdDuration::from_millis(2000)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn bridged_idle_timer_is_idempotent_while_armed() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut timers = TimerSet::new();
        timers.arm_bridged_idle(5000, tx.clone());
        assert!(timers.bridged_idle_armed());
        // Second call while armed must not replace the first timer's token.
        timers.arm_bridged_idle(5000, tx);
        assert!(timers.bridged_idle_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_bridged_idle_clears_active_flag() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut timers = TimerSet::new();
        timers.arm_bridged_idle(5000, tx);
        timers.cancel_bridged_idle();
        assert!(!timers.bridged_idle_armed());
    }
}
