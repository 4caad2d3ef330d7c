//! In-memory stand-ins for the outbound ports, shared by the integration tests.
//!
//! Unlike the mockall doubles these keep state, so a test can delete a status
//! message behind the reconciler's back or move the clock forward.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use domains::{
    ChannelId, ChannelMessenger, Clock, DeliveryError, MessageId, MessengerError,
    NotificationSink, ReachabilityProbe, StatusMessageHandle, WebhookMessage,
};

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock().unwrap() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc.with_ymd_and_hms(2024, 8, 1, 12, 0, 0).unwrap())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Keeps every delivered payload; optionally fails instead.
#[derive(Default)]
pub struct RecordingSink {
    received: Mutex<Vec<WebhookMessage>>,
    fail_with: Option<DeliveryError>,
}

impl RecordingSink {
    pub fn failing(error: DeliveryError) -> Self {
        Self {
            received: Mutex::default(),
            fail_with: Some(error),
        }
    }

    pub fn received(&self) -> Vec<WebhookMessage> {
        self.received.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    /// Waits for background deliveries until `expected` arrived or a second passed.
    pub async fn wait_for(&self, expected: usize) -> usize {
        for _ in 0..100 {
            if self.count() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.count()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, message: &WebhookMessage) -> Result<(), DeliveryError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.received.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// A chat server with one message table for all channels.
pub struct InMemoryMessenger {
    messages: Mutex<HashMap<StatusMessageHandle, String>>,
    next_id: Mutex<u64>,
    lookup_delay: Duration,
}

impl Default for InMemoryMessenger {
    fn default() -> Self {
        Self {
            messages: Mutex::default(),
            next_id: Mutex::new(1000),
            lookup_delay: Duration::ZERO,
        }
    }
}

impl InMemoryMessenger {
    /// Makes every existence lookup take `delay`, like a slow REST round trip.
    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = delay;
        self
    }

    /// Pre-seeds a message as if it had been posted by an earlier run.
    pub fn seed(&self, channel: ChannelId, message: MessageId, content: &str) -> StatusMessageHandle {
        let handle = StatusMessageHandle { channel, message };
        self.messages.lock().unwrap().insert(handle, content.to_string());
        handle
    }

    /// Simulates a moderator deleting the message.
    pub fn delete(&self, handle: StatusMessageHandle) {
        self.messages.lock().unwrap().remove(&handle);
    }

    pub fn content(&self, handle: StatusMessageHandle) -> Option<String> {
        self.messages.lock().unwrap().get(&handle).cloned()
    }

    /// Messages in `channel`, oldest first.
    pub fn in_channel(&self, channel: ChannelId) -> Vec<(StatusMessageHandle, String)> {
        let mut found: Vec<_> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _)| h.channel == channel)
            .map(|(h, c)| (*h, c.clone()))
            .collect();
        found.sort_by_key(|(h, _)| h.message.0);
        found
    }
}

#[async_trait]
impl ChannelMessenger for InMemoryMessenger {
    async fn message_exists(&self, handle: StatusMessageHandle) -> Result<bool, MessengerError> {
        if !self.lookup_delay.is_zero() {
            tokio::time::sleep(self.lookup_delay).await;
        }
        Ok(self.messages.lock().unwrap().contains_key(&handle))
    }

    async fn create_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<StatusMessageHandle, MessengerError> {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let handle = StatusMessageHandle {
            channel,
            message: MessageId(*next),
        };
        self.messages.lock().unwrap().insert(handle, content.to_string());
        Ok(handle)
    }

    async fn edit_message(
        &self,
        handle: StatusMessageHandle,
        content: &str,
    ) -> Result<(), MessengerError> {
        match self.messages.lock().unwrap().get_mut(&handle) {
            Some(existing) => {
                *existing = content.to_string();
                Ok(())
            }
            None => Err(MessengerError::MessageNotFound(handle)),
        }
    }
}

/// Answers probes from a queue; an exhausted queue reports a transport error.
#[derive(Default)]
pub struct ScriptedProbe {
    answers: Mutex<VecDeque<Result<String, DeliveryError>>>,
}

impl ScriptedProbe {
    pub fn push(&self, answer: Result<String, DeliveryError>) {
        self.answers.lock().unwrap().push_back(answer);
    }
}

#[async_trait]
impl ReachabilityProbe for ScriptedProbe {
    async fn probe(&self) -> Result<String, DeliveryError> {
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DeliveryError::Transport("no scripted answer".into())))
    }
}
