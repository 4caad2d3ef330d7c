//! `ChannelMessenger` on top of the Discord REST API.

use std::sync::Arc;

use async_trait::async_trait;
use domains::{ChannelId, ChannelMessenger, MessageId, MessengerError, StatusMessageHandle};
use serenity::all::{
    ChannelId as DiscordChannelId, CreateMessage, EditMessage, MessageId as DiscordMessageId,
};
use serenity::http::Http;

pub struct DiscordMessenger {
    http: Arc<Http>,
}

impl DiscordMessenger {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn channel(id: ChannelId) -> DiscordChannelId {
    DiscordChannelId::new(id.0)
}

fn message(id: MessageId) -> DiscordMessageId {
    DiscordMessageId::new(id.0)
}

/// Discord answers `404` (code 10008, "Unknown Message") for deleted messages.
fn is_not_found(err: &serenity::Error) -> bool {
    match err {
        serenity::Error::Http(http) => http.status_code().map(|s| s.as_u16()) == Some(404),
        _ => false,
    }
}

fn transport(err: serenity::Error) -> MessengerError {
    MessengerError::Transport(err.to_string())
}

#[async_trait]
impl ChannelMessenger for DiscordMessenger {
    async fn message_exists(&self, handle: StatusMessageHandle) -> Result<bool, MessengerError> {
        match channel(handle.channel)
            .message(&*self.http, message(handle.message))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(transport(e)),
        }
    }

    async fn create_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<StatusMessageHandle, MessengerError> {
        let sent = channel(channel_id)
            .send_message(&*self.http, CreateMessage::new().content(content))
            .await
            .map_err(transport)?;
        Ok(StatusMessageHandle {
            channel: channel_id,
            message: MessageId(sent.id.get()),
        })
    }

    async fn edit_message(
        &self,
        handle: StatusMessageHandle,
        content: &str,
    ) -> Result<(), MessengerError> {
        channel(handle.channel)
            .edit_message(
                &*self.http,
                message(handle.message),
                EditMessage::new().content(content),
            )
            .await
            .map(|_| ())
            .map_err(|e| {
                if is_not_found(&e) {
                    MessengerError::MessageNotFound(handle)
                } else {
                    transport(e)
                }
            })
    }
}
