//! # Support Intake
//!
//! Validates a support request, enforces the ban list and relays accepted
//! requests to the support sink.

use std::sync::Arc;

use domains::{
    BanListSource, Clock, Embed, Identity, NotificationSink, SubmissionError, SubmissionRecord,
    SubmissionResult, SupportRequest, WebhookMessage,
};
use tracing::{info, instrument, warn};

use crate::abuse::AbuseNotifier;
use crate::identity::{derive_identity, is_banned};

const SUPPORT_COLOR: u32 = 0x3498db;

/// Knobs that shape the outgoing support alert.
#[derive(Debug, Clone, Default)]
pub struct SupportSettings {
    /// Role pinged in the message content, e.g. the support team.
    pub mention_role_id: Option<u64>,
}

pub struct SupportService {
    bans: Arc<dyn BanListSource>,
    notifier: Arc<AbuseNotifier>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    settings: SupportSettings,
}

impl SupportService {
    pub fn new(
        bans: Arc<dyn BanListSource>,
        notifier: Arc<AbuseNotifier>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        settings: SupportSettings,
    ) -> Self {
        Self {
            bans,
            notifier,
            sink,
            clock,
            settings,
        }
    }

    /// Ban check with the debounced abuse alert as a side effect.
    ///
    /// The answer never depends on whether the alert goes out.
    pub fn check_ban(&self, identity: &Identity, source_address: &str) -> bool {
        let snapshot = self.bans.snapshot();
        if !is_banned(identity, &snapshot) {
            return false;
        }
        warn!(%identity, "banned identity attempted a submission");
        self.notifier.maybe_notify(identity, source_address);
        true
    }

    /// Runs a submission through validation, ban check and delivery.
    #[instrument(skip_all, fields(source = %request.source_address))]
    pub async fn submit(&self, request: SupportRequest) -> SubmissionResult<SubmissionRecord> {
        if [&request.nickname, &request.email, &request.description]
            .iter()
            .any(|f| f.trim().is_empty())
        {
            return Err(SubmissionError::MissingFields);
        }

        let identity = derive_identity(&request.agent, &request.source_address);
        if self.check_ban(&identity, &request.source_address) {
            return Err(SubmissionError::Banned);
        }

        let record = SubmissionRecord {
            nickname: request.nickname,
            email: request.email,
            description: request.description,
            identity,
            source_address: request.source_address,
            submitted_at: self.clock.now(),
        };

        let payload = support_payload(&record, self.settings.mention_role_id);
        if let Err(e) = self.sink.deliver(&payload).await {
            warn!(identity = %record.identity, error = %e, "support request delivery failed");
            return Err(e.into());
        }

        info!(identity = %record.identity, "support request relayed");
        Ok(record)
    }
}

/// Builds the "Support Request" embed forwarded to the support sink.
pub fn support_payload(record: &SubmissionRecord, mention_role_id: Option<u64>) -> WebhookMessage {
    WebhookMessage {
        content: mention_role_id.map(|id| format!("<@&{id}>")),
        embeds: vec![support_embed(record)],
    }
}

fn support_embed(record: &SubmissionRecord) -> Embed {
    Embed::new("Support Request", SUPPORT_COLOR)
        .field("Nickname", &record.nickname)
        .field("Email", &record.email)
        .field("Description", &record.description)
        .field("User ID", record.identity.as_str())
        .field("IP Address", &record.source_address)
        .footer("Help Within 24 Hours!")
        .timestamp(record.submitted_at)
}
