//! Debounced alerts for submissions from banned identities.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use domains::{AbuseLedger, Clock, Embed, Identity, NotificationSink, WebhookMessage};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const ABUSE_COLOR: u32 = 0xe74c3c;

/// Rolling window between two alerts for the same identity.
pub fn default_window() -> TimeDelta {
    TimeDelta::hours(1)
}

/// Sends at most one abuse alert per identity per window.
pub struct AbuseNotifier {
    ledger: Arc<dyn AbuseLedger>,
    /// `None` when no abuse webhook is configured; claims are still recorded.
    sink: Option<Arc<dyn NotificationSink>>,
    clock: Arc<dyn Clock>,
    window: TimeDelta,
}

impl AbuseNotifier {
    pub fn new(
        ledger: Arc<dyn AbuseLedger>,
        sink: Option<Arc<dyn NotificationSink>>,
        clock: Arc<dyn Clock>,
        window: TimeDelta,
    ) -> Self {
        Self {
            ledger,
            sink,
            clock,
            window,
        }
    }

    /// Claims the window for `identity` and dispatches the alert in the background.
    ///
    /// The claim is recorded before delivery starts, so a failing sink never
    /// causes a second alert inside the window. Returns the delivery task when
    /// one was spawned.
    pub fn maybe_notify(&self, identity: &Identity, source_address: &str) -> Option<JoinHandle<()>> {
        let now = self.clock.now();
        if !self.ledger.try_claim(identity, now, self.window) {
            debug!(%identity, "abuse alert suppressed, already notified within window");
            return None;
        }

        let Some(sink) = self.sink.clone() else {
            debug!(%identity, "no abuse sink configured, alert dropped");
            return None;
        };

        let payload = abuse_payload(identity, source_address, now);
        let identity = identity.clone();
        Some(tokio::spawn(async move {
            match sink.deliver(&payload).await {
                Ok(()) => info!(%identity, "abuse alert delivered"),
                Err(e) => warn!(%identity, error = %e, "abuse alert delivery failed"),
            }
        }))
    }

    /// Forgets identities whose last alert is older than the window.
    pub fn sweep(&self) -> usize {
        let cutoff = self.clock.now() - self.window;
        let removed = self.ledger.sweep(cutoff);
        if removed > 0 {
            debug!(removed, remaining = self.ledger.len(), "swept abuse ledger");
        }
        removed
    }

    /// Sweeps the ledger on a fixed period, forever.
    pub async fn run_sweeper(self: Arc<Self>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.sweep();
        }
    }
}

pub fn abuse_payload(identity: &Identity, source_address: &str, at: DateTime<Utc>) -> WebhookMessage {
    WebhookMessage {
        content: None,
        embeds: vec![Embed::new("Banned User Attempt", ABUSE_COLOR)
            .field("User ID", identity.as_str())
            .field("IP Address", source_address)
            .footer("A banned user tried to submit a support request")
            .timestamp(at)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use domains::{DeliveryError, MockAbuseLedger, MockClock, MockNotificationSink};

    fn fixed_clock() -> Arc<dyn Clock> {
        let mut clock = MockClock::new();
        clock
            .expect_now()
            .returning(|| Utc.with_ymd_and_hms(2024, 8, 1, 12, 0, 0).unwrap());
        Arc::new(clock)
    }

    #[tokio::test]
    async fn claimed_identity_gets_one_alert() {
        let mut ledger = MockAbuseLedger::new();
        ledger.expect_try_claim().times(1).return_const(true);
        let mut sink = MockNotificationSink::new();
        sink.expect_deliver()
            .withf(|m| m.embeds[0].title == "Banned User Attempt")
            .times(1)
            .returning(|_| Ok(()));

        let notifier = AbuseNotifier::new(
            Arc::new(ledger),
            Some(Arc::new(sink)),
            fixed_clock(),
            default_window(),
        );
        let task = notifier.maybe_notify(&Identity::new("abc"), "203.0.113.7");
        task.expect("alert should be dispatched").await.unwrap();
    }

    #[tokio::test]
    async fn debounced_identity_sends_nothing() {
        let mut ledger = MockAbuseLedger::new();
        ledger.expect_try_claim().return_const(false);
        let mut sink = MockNotificationSink::new();
        sink.expect_deliver().never();

        let notifier = AbuseNotifier::new(
            Arc::new(ledger),
            Some(Arc::new(sink)),
            fixed_clock(),
            default_window(),
        );
        assert!(notifier.maybe_notify(&Identity::new("abc"), "x").is_none());
    }

    #[tokio::test]
    async fn failed_delivery_is_swallowed() {
        let mut ledger = MockAbuseLedger::new();
        ledger.expect_try_claim().return_const(true);
        let mut sink = MockNotificationSink::new();
        sink.expect_deliver()
            .returning(|_| Err(DeliveryError::UnexpectedStatus { status: 500 }));

        let notifier = AbuseNotifier::new(
            Arc::new(ledger),
            Some(Arc::new(sink)),
            fixed_clock(),
            default_window(),
        );
        let task = notifier.maybe_notify(&Identity::new("abc"), "x").unwrap();
        assert!(task.await.is_ok());
    }

    #[tokio::test]
    async fn missing_sink_still_records_claim() {
        let mut ledger = MockAbuseLedger::new();
        ledger.expect_try_claim().times(1).return_const(true);

        let notifier = AbuseNotifier::new(Arc::new(ledger), None, fixed_clock(), default_window());
        assert!(notifier.maybe_notify(&Identity::new("abc"), "x").is_none());
    }

    #[test]
    fn sweep_uses_window_cutoff() {
        let mut ledger = MockAbuseLedger::new();
        ledger
            .expect_sweep()
            .withf(|cutoff| *cutoff == Utc.with_ymd_and_hms(2024, 8, 1, 11, 0, 0).unwrap())
            .return_const(3usize);
        ledger.expect_len().return_const(0usize);

        let notifier = AbuseNotifier::new(Arc::new(ledger), None, fixed_clock(), default_window());
        assert_eq!(notifier.sweep(), 3);
    }
}
