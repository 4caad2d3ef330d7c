//! # Core Traits (Ports)
//!
//! Adapters implement these; services only ever see the traits.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{DeliveryError, MessengerError};
use crate::models::{BanList, ChannelId, Identity, StatusMessageHandle, WebhookMessage};

/// A webhook-style endpoint that accepts structured alert payloads.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Posts the payload. `Ok` only when the sink acknowledged it.
    async fn deliver(&self, message: &WebhookMessage) -> Result<(), DeliveryError>;
}

/// Where the ban list comes from.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait BanListSource: Send + Sync {
    /// Returns a consistent snapshot for a single check.
    fn snapshot(&self) -> BanList;
}

/// Last-notified bookkeeping for abuse alerts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AbuseLedger: Send + Sync {
    /// Atomically checks the window and records `now` for `identity`.
    ///
    /// Returns `true` when the caller should send a notification: the identity
    /// was never notified, or its last notification is older than `window`.
    /// The record is written before returning, whatever the caller does next.
    fn try_claim(&self, identity: &Identity, now: DateTime<Utc>, window: TimeDelta) -> bool;

    /// Drops entries last notified before `cutoff`. Returns how many went.
    fn sweep(&self, cutoff: DateTime<Utc>) -> usize;

    fn len(&self) -> usize;
}

/// Wall clock, injectable for tests.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Create/edit access to chat channels (status messages and alerts).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ChannelMessenger: Send + Sync {
    /// Whether the message behind `handle` still exists.
    async fn message_exists(&self, handle: StatusMessageHandle) -> Result<bool, MessengerError>;

    /// Posts a new message and returns its handle.
    async fn create_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<StatusMessageHandle, MessengerError>;

    /// Replaces the content of an existing message.
    ///
    /// Fails with [`MessengerError::MessageNotFound`] when it was deleted.
    async fn edit_message(
        &self,
        handle: StatusMessageHandle,
        content: &str,
    ) -> Result<(), MessengerError>;
}

/// Reachability check against the public website.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Returns the response body of a 2xx answer.
    async fn probe(&self) -> Result<String, DeliveryError>;
}
