//! # Status Reconciliation
//!
//! Keeps the two public status messages (companion bot, website) in line with
//! what the service observes:
//!
//! * presence signals drive an `Online` / `Offline` state machine; only real
//!   transitions publish anything,
//! * a fixed-interval poller classifies the website and edits its message when
//!   the classification changes.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use domains::{
    BotPresence, ChannelId, ChannelMessenger, Clock, MessageId, PresenceSignal, ReachabilityProbe,
    WebsiteStatus,
};
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::status_message::{Resolved, StatusMessageSlot};

/// Where status messages and alerts go, and how they read.
#[derive(Debug, Clone)]
pub struct StatusSettings {
    /// Name used in message text, e.g. "Gido".
    pub display_name: String,
    pub website_url: String,
    pub bot_status_channel: ChannelId,
    pub bot_status_message: Option<MessageId>,
    pub website_status_channel: ChannelId,
    pub website_status_message: Option<MessageId>,
    pub ping_channel: ChannelId,
    pub ping_role_id: Option<u64>,
}

pub struct StatusReconciler {
    messenger: Arc<dyn ChannelMessenger>,
    probe: Arc<dyn ReachabilityProbe>,
    clock: Arc<dyn Clock>,
    settings: StatusSettings,
    bot_slot: StatusMessageSlot,
    website_slot: StatusMessageSlot,
    /// Held for a whole transition so presence handling never interleaves.
    presence: Mutex<BotPresence>,
    /// Lock-free view of `presence` for readers such as the HTTP API.
    presence_view: watch::Sender<BotPresence>,
    website: Mutex<WebsiteStatus>,
}

impl StatusReconciler {
    pub fn new(
        messenger: Arc<dyn ChannelMessenger>,
        probe: Arc<dyn ReachabilityProbe>,
        clock: Arc<dyn Clock>,
        settings: StatusSettings,
    ) -> Self {
        let initial = BotPresence::Offline { since: clock.now() };
        let bot_slot = StatusMessageSlot::new(
            "bot",
            settings.bot_status_channel,
            settings.bot_status_message,
        );
        let website_slot = StatusMessageSlot::new(
            "website",
            settings.website_status_channel,
            settings.website_status_message,
        );
        Self {
            messenger,
            probe,
            clock,
            settings,
            bot_slot,
            website_slot,
            presence: Mutex::new(initial),
            presence_view: watch::Sender::new(initial),
            website: Mutex::new(WebsiteStatus::Offline),
        }
    }

    pub fn presence(&self) -> BotPresence {
        *self.presence_view.borrow()
    }

    pub async fn website_status(&self) -> WebsiteStatus {
        *self.website.lock().await
    }

    /// Makes sure both status messages exist and shows the current presence.
    ///
    /// The presence lock is held until the bot message is written, so a
    /// transition racing with startup always lands after it. The website
    /// status is reset to "Checking" whether its message was found or created:
    /// the content of a message left by an earlier run is unknown, so the next
    /// poll always publishes a concrete state.
    pub async fn bootstrap(&self) {
        {
            let presence = self.presence.lock().await;
            let bot_content = self.bot_status_content(*presence);
            match self.bot_slot.ensure(self.messenger.as_ref(), &bot_content).await {
                Ok(Resolved::Existing(_)) => {
                    if let Err(e) = self.bot_slot.update(self.messenger.as_ref(), &bot_content).await {
                        warn!(error = %e, "failed to refresh bot status message");
                    }
                }
                Ok(Resolved::Created(_)) => {}
                Err(e) => warn!(error = %e, "failed to resolve bot status message"),
            }
        }

        let mut website = self.website.lock().await;
        let placeholder = self.website_status_content(WebsiteStatus::Checking);
        if let Err(e) = self.website_slot.ensure(self.messenger.as_ref(), &placeholder).await {
            warn!(error = %e, "failed to resolve website status message");
        }
        *website = WebsiteStatus::Checking;
    }

    /// Applies a presence signal for the watched bot.
    ///
    /// Returns `true` when it caused a transition. Same-state signals are
    /// dropped without touching messages or alerts.
    pub async fn on_presence(&self, signal: PresenceSignal) -> bool {
        let mut presence = self.presence.lock().await;
        let now = self.clock.now();
        let next = match (*presence, signal) {
            (BotPresence::Offline { .. }, PresenceSignal::Active) => BotPresence::Online { since: now },
            (BotPresence::Online { .. }, PresenceSignal::Inactive) => BotPresence::Offline { since: now },
            _ => {
                debug!(?signal, "presence unchanged");
                return false;
            }
        };

        *presence = next;
        self.presence_view.send_replace(next);
        info!(status = next.label(), "companion bot presence changed");

        match next {
            BotPresence::Online { since } => {
                self.publish_bot_status(next).await;
                self.send_alert(&self.back_online_alert(since)).await;
            }
            BotPresence::Offline { since } => {
                self.send_alert(&self.offline_alert(since)).await;
                self.publish_bot_status(next).await;
            }
        }
        true
    }

    /// One poll of the website. Returns the newly published status, if any.
    ///
    /// The recorded status only moves once the message edit succeeded, so a
    /// failed edit is retried on the next tick.
    pub async fn poll_website(&self) -> Option<WebsiteStatus> {
        let observed = self.classify_website().await;
        let mut last = self.website.lock().await;
        if *last == observed {
            return None;
        }

        let content = self.website_status_content(observed);
        match self.website_slot.update(self.messenger.as_ref(), &content).await {
            Ok(()) => {
                info!(from = last.label(), to = observed.label(), "website status changed");
                *last = observed;
                Some(observed)
            }
            Err(e) => {
                warn!(error = %e, "failed to update website status message, skipping this cycle");
                None
            }
        }
    }

    /// Polls forever on a fixed interval. The first tick fires immediately.
    pub async fn run_poller(self: Arc<Self>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.poll_website().await;
        }
    }

    async fn classify_website(&self) -> WebsiteStatus {
        match self.probe.probe().await {
            Ok(body) if !body.is_empty() => WebsiteStatus::Online,
            Ok(_) => {
                debug!("website answered with an empty body");
                WebsiteStatus::Offline
            }
            Err(e) => {
                debug!(error = %e, "website probe failed");
                WebsiteStatus::Offline
            }
        }
    }

    async fn publish_bot_status(&self, presence: BotPresence) {
        let content = self.bot_status_content(presence);
        if let Err(e) = self.bot_slot.update(self.messenger.as_ref(), &content).await {
            warn!(error = %e, "failed to update bot status message");
        }
    }

    async fn send_alert(&self, content: &str) {
        if let Err(e) = self
            .messenger
            .create_message(self.settings.ping_channel, content)
            .await
        {
            warn!(error = %e, "failed to send presence alert");
        }
    }

    fn bot_status_content(&self, presence: BotPresence) -> String {
        let name = &self.settings.display_name;
        match presence {
            BotPresence::Online { since } => {
                format!("🟢 **{name} is online**\nOnline since {}", relative(since))
            }
            BotPresence::Offline { since } => {
                format!("🔴 **{name} is offline**\nOffline since {}", relative(since))
            }
        }
    }

    fn website_status_content(&self, status: WebsiteStatus) -> String {
        let icon = match status {
            WebsiteStatus::Online => "🟢",
            WebsiteStatus::Offline => "🔴",
            WebsiteStatus::Checking => "🟡",
        };
        format!(
            "{icon} **Website: {}**\n<{}>\nSince {}",
            status.label(),
            self.settings.website_url,
            relative(self.clock.now())
        )
    }

    fn back_online_alert(&self, since: DateTime<Utc>) -> String {
        format!("✅ {} is back online ({}).", self.settings.display_name, relative(since))
    }

    fn offline_alert(&self, since: DateTime<Utc>) -> String {
        let mention = self
            .settings
            .ping_role_id
            .map(|id| format!("<@&{id}> "))
            .unwrap_or_default();
        format!("{mention}⚠️ {} went offline {}.", self.settings.display_name, relative(since))
    }
}

/// Discord relative timestamp markup.
fn relative(at: DateTime<Utc>) -> String {
    format!("<t:{}:R>", at.timestamp())
}
