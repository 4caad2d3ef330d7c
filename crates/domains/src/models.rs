//! # Domain Models
//!
//! Plain data shared by the support intake and status services.
//! Nothing in here performs I/O; adapters translate these to the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Pseudonymous fingerprint of a submitter.
///
/// Derived per request from the client agent string and network address.
/// Never persisted; only ever compared against the ban list and used as the
/// key of the abuse-notification ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of banned identities, read atomically for one check.
///
/// An empty list bans nobody.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BanList {
    entries: BTreeSet<String>,
}

impl BanList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().trim().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Splits a delimited string (e.g. `BANNED_USERS=a/b/c`).
    pub fn parse_delimited(raw: &str, delimiter: char) -> Self {
        Self::new(raw.split(delimiter))
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.entries.contains(identity.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A support request as it travels from the HTTP layer to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportRequest {
    pub nickname: String,
    pub email: String,
    pub description: String,
    /// Client-declared `User-Agent`, `"undefined"` when absent.
    pub agent: String,
    /// Resolved client address (forwarded-for or peer).
    pub source_address: String,
}

/// Accepted submission, kept only while the request is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub nickname: String,
    pub email: String,
    pub description: String,
    pub identity: Identity,
    pub source_address: String,
    pub submitted_at: DateTime<Utc>,
}

// ── Webhook payloads ────────────────────────────────────────────────────────

/// Body posted to a Discord-style webhook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    /// RFC 3339; Discord renders it in the viewer's locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Embed {
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            color,
            ..Default::default()
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

// ── Status reconciliation ───────────────────────────────────────────────────

/// Discord snowflake of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

/// Discord snowflake of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

/// Points at an externally hosted status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusMessageHandle {
    pub channel: ChannelId,
    pub message: MessageId,
}

/// What a presence update says about the watched process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceSignal {
    Active,
    Inactive,
}

/// Presence of the companion bot.
///
/// Encoded as an enum so that exactly one of `online_since` / `offline_since`
/// can ever be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BotPresence {
    Online { since: DateTime<Utc> },
    Offline { since: DateTime<Utc> },
}

impl BotPresence {
    pub fn is_online(&self) -> bool {
        matches!(self, BotPresence::Online { .. })
    }

    pub fn online_since(&self) -> Option<DateTime<Utc>> {
        match self {
            BotPresence::Online { since } => Some(*since),
            BotPresence::Offline { .. } => None,
        }
    }

    pub fn offline_since(&self) -> Option<DateTime<Utc>> {
        match self {
            BotPresence::Offline { since } => Some(*since),
            BotPresence::Online { .. } => None,
        }
    }

    /// `"online"` / `"offline"`, as served by `GET /api/status`.
    pub fn label(&self) -> &'static str {
        if self.is_online() {
            "online"
        } else {
            "offline"
        }
    }
}

/// Last classification of the public website.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebsiteStatus {
    Online,
    Offline,
    Checking,
}

impl WebsiteStatus {
    pub fn label(&self) -> &'static str {
        match self {
            WebsiteStatus::Online => "Online",
            WebsiteStatus::Offline => "Offline",
            WebsiteStatus::Checking => "Checking",
        }
    }
}
