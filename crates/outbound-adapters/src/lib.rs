//! # outbound-adapters
//!
//! Everything that calls out of the process: Discord webhooks, the Discord
//! REST API and gateway, and the website probe.

pub mod discord;
pub mod gateway;
pub mod probe;
pub mod webhook;

pub use discord::DiscordMessenger;
pub use gateway::{run_gateway, PresenceHandler};
pub use probe::HttpProbe;
pub use webhook::WebhookSink;
