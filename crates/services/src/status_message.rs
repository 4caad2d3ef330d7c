//! Lazily resolved handle to a status message that the bot keeps editing.

use domains::{ChannelId, ChannelMessenger, MessageId, MessengerError, StatusMessageHandle};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// How [`StatusMessageSlot::ensure`] obtained the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// Already cached, or found under the configured id.
    Existing(StatusMessageHandle),
    /// Posted a fresh message with the placeholder content.
    Created(StatusMessageHandle),
}

/// One status message on one channel.
///
/// The configured id is tried first. When it is missing (or deleted later)
/// a new message is posted and its id kept in memory for the process.
pub struct StatusMessageSlot {
    name: &'static str,
    channel: ChannelId,
    state: Mutex<SlotState>,
}

struct SlotState {
    /// Consumed by the first lookup.
    configured: Option<MessageId>,
    cached: Option<StatusMessageHandle>,
}

impl StatusMessageSlot {
    pub fn new(name: &'static str, channel: ChannelId, configured: Option<MessageId>) -> Self {
        Self {
            name,
            channel,
            state: Mutex::new(SlotState {
                configured,
                cached: None,
            }),
        }
    }

    pub async fn cached(&self) -> Option<StatusMessageHandle> {
        self.state.lock().await.cached
    }

    /// Resolves the handle, posting `placeholder` if no message exists yet.
    pub async fn ensure(
        &self,
        messenger: &dyn ChannelMessenger,
        placeholder: &str,
    ) -> Result<Resolved, MessengerError> {
        let mut state = self.state.lock().await;
        if let Some(handle) = state.cached {
            return Ok(Resolved::Existing(handle));
        }

        // Configured ids are only trusted once; after a deletion we stop asking.
        if let Some(message) = state.configured {
            let handle = StatusMessageHandle {
                channel: self.channel,
                message,
            };
            let exists = messenger.message_exists(handle).await?;
            state.configured = None;
            if exists {
                debug!(slot = self.name, message = message.0, "using configured status message");
                state.cached = Some(handle);
                return Ok(Resolved::Existing(handle));
            }
        }

        let handle = messenger.create_message(self.channel, placeholder).await?;
        info!(slot = self.name, message = handle.message.0, "created status message");
        state.cached = Some(handle);
        Ok(Resolved::Created(handle))
    }

    /// Writes `content` into the status message.
    ///
    /// A deleted message is logged and forgotten; the following call posts a
    /// new one instead of failing forever.
    pub async fn update(
        &self,
        messenger: &dyn ChannelMessenger,
        content: &str,
    ) -> Result<(), MessengerError> {
        let handle = match self.ensure(messenger, content).await? {
            Resolved::Created(_) => return Ok(()),
            Resolved::Existing(handle) => handle,
        };

        match messenger.edit_message(handle, content).await {
            Ok(()) => Ok(()),
            Err(MessengerError::MessageNotFound(stale)) => {
                warn!(
                    slot = self.name,
                    message = stale.message.0,
                    "status message was deleted, will recreate on next update"
                );
                let mut state = self.state.lock().await;
                if state.cached == Some(stale) {
                    state.cached = None;
                }
                Err(MessengerError::MessageNotFound(stale))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockChannelMessenger;

    fn handle(message: u64) -> StatusMessageHandle {
        StatusMessageHandle {
            channel: ChannelId(10),
            message: MessageId(message),
        }
    }

    #[tokio::test]
    async fn configured_message_is_reused() {
        let mut messenger = MockChannelMessenger::new();
        messenger.expect_message_exists().times(1).returning(|_| Ok(true));
        messenger.expect_create_message().never();
        messenger
            .expect_edit_message()
            .withf(|h, c| *h == handle(20) && c == "hello")
            .times(2)
            .returning(|_, _| Ok(()));

        let slot = StatusMessageSlot::new("bot", ChannelId(10), Some(MessageId(20)));
        slot.update(&messenger, "hello").await.unwrap();
        slot.update(&messenger, "hello").await.unwrap();
        assert_eq!(slot.cached().await, Some(handle(20)));
    }

    #[tokio::test]
    async fn missing_configured_message_is_created() {
        let mut messenger = MockChannelMessenger::new();
        messenger.expect_message_exists().returning(|_| Ok(false));
        messenger
            .expect_create_message()
            .times(1)
            .returning(|_, _| Ok(handle(30)));
        messenger.expect_edit_message().never();

        let slot = StatusMessageSlot::new("bot", ChannelId(10), Some(MessageId(20)));
        let resolved = slot.ensure(&messenger, "Checking").await.unwrap();
        assert_eq!(resolved, Resolved::Created(handle(30)));
    }

    #[tokio::test]
    async fn deleted_message_is_recreated_on_next_update() {
        let mut messenger = MockChannelMessenger::new();
        messenger.expect_message_exists().times(1).returning(|_| Ok(true));
        messenger
            .expect_edit_message()
            .times(1)
            .returning(|h, _| Err(MessengerError::MessageNotFound(h)));
        messenger
            .expect_create_message()
            .withf(|c, content| *c == ChannelId(10) && content == "second")
            .times(1)
            .returning(|_, _| Ok(handle(40)));

        let slot = StatusMessageSlot::new("website", ChannelId(10), Some(MessageId(20)));
        let first = slot.update(&messenger, "first").await;
        assert!(matches!(first, Err(MessengerError::MessageNotFound(_))));
        assert_eq!(slot.cached().await, None);

        slot.update(&messenger, "second").await.unwrap();
        assert_eq!(slot.cached().await, Some(handle(40)));
    }
}
