//! Discord gateway connection feeding presence signals to the reconciler.

use std::sync::Arc;

use domains::PresenceSignal;
use serenity::all::{
    Context, EventHandler, GatewayIntents, Guild, OnlineStatus, Presence, Ready, UserId,
};
use serenity::async_trait;
use serenity::Client;
use services::StatusReconciler;
use tracing::{debug, info};

/// Listens for presence updates of one user (the companion bot).
pub struct PresenceHandler {
    watched: UserId,
    reconciler: Arc<StatusReconciler>,
}

impl PresenceHandler {
    pub fn new(watched_user_id: u64, reconciler: Arc<StatusReconciler>) -> Self {
        Self {
            watched: UserId::new(watched_user_id),
            reconciler,
        }
    }
}

/// Online, idle and do-not-disturb all mean the process is running.
pub fn signal_for(status: OnlineStatus) -> PresenceSignal {
    match status {
        OnlineStatus::Online | OnlineStatus::Idle | OnlineStatus::DoNotDisturb => {
            PresenceSignal::Active
        }
        _ => PresenceSignal::Inactive,
    }
}

#[async_trait]
impl EventHandler for PresenceHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "gateway ready");
        self.reconciler.bootstrap().await;
    }

    // Initial presences arrive inside the guild payload, not as updates.
    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
        if let Some(presence) = guild.presences.get(&self.watched) {
            debug!(guild = %guild.id, status = ?presence.status, "initial presence of watched bot");
            self.reconciler.on_presence(signal_for(presence.status)).await;
        }
    }

    async fn presence_update(&self, _ctx: Context, new_data: Presence) {
        if new_data.user.id != self.watched {
            return;
        }
        self.reconciler.on_presence(signal_for(new_data.status)).await;
    }
}

/// Connects to the gateway and dispatches events until the connection dies.
pub async fn run_gateway(token: &str, handler: PresenceHandler) -> serenity::Result<()> {
    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_PRESENCES;
    let mut client = Client::builder(token, intents)
        .event_handler(handler)
        .await?;
    client.start().await
}
