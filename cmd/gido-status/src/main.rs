//! # gido-status
//!
//! Watches the companion bot's Discord presence and the website, keeps the
//! two status messages current, and serves `GET /api/status`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api_adapters::{shutdown_signal, status_router, StatusState};
use configs::telemetry::{exit_on_panic, init_logging};
use configs::{required, AppConfig};
use domains::{ChannelId, MessageId, SystemClock};
use outbound_adapters::{run_gateway, DiscordMessenger, HttpProbe, PresenceHandler};
use secrecy::ExposeSecret;
use serenity::http::Http;
use services::{StatusReconciler, StatusSettings};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_logging(&config.log);
    exit_on_panic();

    let status = config.status;
    let token = required(status.bot_token, "status.bot_token")?;
    let watched = required(status.watched_user_id, "status.watched_user_id")?;
    let settings = StatusSettings {
        display_name: status.display_name,
        website_url: required(status.website_url, "status.website_url")?,
        bot_status_channel: ChannelId(required(
            status.bot_status_channel_id,
            "status.bot_status_channel_id",
        )?),
        bot_status_message: status.bot_status_message_id.map(MessageId),
        website_status_channel: ChannelId(required(
            status.website_status_channel_id,
            "status.website_status_channel_id",
        )?),
        website_status_message: status.website_status_message_id.map(MessageId),
        ping_channel: ChannelId(required(status.ping_channel_id, "status.ping_channel_id")?),
        ping_role_id: status.ping_role_id,
    };

    // 1. Discord REST + website probe behind the reconciler
    let http = Arc::new(Http::new(token.expose_secret()));
    let probe = HttpProbe::new(reqwest::Client::new(), settings.website_url.clone());
    let reconciler = Arc::new(StatusReconciler::new(
        Arc::new(DiscordMessenger::new(http)),
        Arc::new(probe),
        Arc::new(SystemClock),
        settings,
    ));

    // 2. Website poller
    tokio::spawn(
        reconciler
            .clone()
            .run_poller(Duration::from_secs(status.poll_interval_secs)),
    );

    // 3. Status API
    let address = format!("{}:{}", config.server.host, status.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, "gido-status API listening");
    let app = status_router(
        StatusState {
            reconciler: reconciler.clone(),
        },
        &config.server.allowed_origins,
    );
    let api = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    // 4. Gateway; the process lives as long as the connection does
    let handler = PresenceHandler::new(watched, reconciler);
    tokio::select! {
        result = run_gateway(token.expose_secret(), handler) => {
            if let Err(e) = &result {
                error!(error = %e, "discord gateway failed");
            }
            result.context("running discord gateway")?;
        }
        served = api => {
            served.context("status API task")?.context("serving HTTP")?;
        }
    }

    info!("gido-status stopped");
    Ok(())
}
