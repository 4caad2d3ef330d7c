//! # gido-web
//!
//! Serves the Gido website and relays the support form to Discord.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api_adapters::{shutdown_signal, site_router, SiteSettings, SiteState};
use auth_adapters::{EnvBanList, StaticBanList, DEFAULT_DELIMITER};
use chrono::TimeDelta;
use configs::telemetry::{exit_on_panic, init_logging};
use configs::{required, AppConfig};
use domains::{BanList, BanListSource, NotificationSink, SystemClock};
use outbound_adapters::WebhookSink;
use services::{AbuseNotifier, SupportService, SupportSettings};
use storage_adapters::MemoryAbuseLedger;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_logging(&config.log);
    exit_on_panic();

    let http = reqwest::Client::new();
    let clock = Arc::new(SystemClock);

    // 1. Outbound webhooks
    let support_sink: Arc<dyn NotificationSink> = Arc::new(WebhookSink::new(
        http.clone(),
        required(config.support.webhook_url, "support.webhook_url")?,
    ));
    let abuse_sink: Option<Arc<dyn NotificationSink>> = match config.support.abuse_webhook_url {
        Some(url) => Some(Arc::new(WebhookSink::new(http.clone(), url))),
        None => {
            warn!("support.abuse_webhook_url not set, banned attempts will only be logged");
            None
        }
    };

    // 2. Ban list: live environment variable or a fixed list
    let bans: Arc<dyn BanListSource> = match &config.support.ban_list_env {
        Some(var) => {
            info!(var = %var, "reading ban list from environment on every request");
            Arc::new(EnvBanList::new(var.clone(), DEFAULT_DELIMITER))
        }
        None => {
            let list = BanList::new(&config.support.ban_list);
            info!(entries = list.len(), "using static ban list");
            Arc::new(StaticBanList::new(list))
        }
    };

    // 3. Abuse debouncing, swept in the background
    let notifier = Arc::new(AbuseNotifier::new(
        Arc::new(MemoryAbuseLedger::new()),
        abuse_sink,
        clock.clone(),
        TimeDelta::minutes(config.support.debounce_minutes),
    ));
    tokio::spawn(
        notifier
            .clone()
            .run_sweeper(Duration::from_secs(config.support.sweep_interval_secs)),
    );

    let support = SupportService::new(
        bans,
        notifier,
        support_sink,
        clock,
        SupportSettings {
            mention_role_id: config.support.mention_role_id,
        },
    );

    // 4. HTTP surface
    let state = SiteState {
        support: Arc::new(support),
        settings: Arc::new(SiteSettings {
            trust_forwarded_for: config.server.trust_forwarded_for,
            ban_contact_url: config.support.ban_contact_url.clone(),
        }),
    };
    let static_dir = Path::new(&config.server.static_dir);
    let static_dir = if static_dir.is_dir() {
        Some(static_dir)
    } else {
        warn!(dir = %static_dir.display(), "static directory missing, serving the API only");
        None
    };
    let app = site_router(state, static_dir, &config.server.allowed_origins);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, "gido-web listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("gido-web stopped");
    Ok(())
}
