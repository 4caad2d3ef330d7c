//! # Handlers
//!
//! Translate HTTP requests into service calls and service results back into
//! status codes.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{header, HeaderMap},
    Json,
};
use domains::SupportRequest;
use serde::{Deserialize, Serialize};
use services::{StatusReconciler, SupportService};
use tracing::debug;

use crate::error::{ApiError, MessageBody};

const ACCEPTED_MESSAGE: &str =
    "Request submitted successfully. You will receive an email within 24 hours.";

/// Agent string hashed for clients that send no `User-Agent`. Existing ban
/// lists were built with this value, so it must not change.
pub const MISSING_AGENT: &str = "undefined";

/// Request-independent settings of the site API.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Use the first `X-Forwarded-For` entry as the client address.
    pub trust_forwarded_for: bool,
    /// Shown to banned submitters.
    pub ban_contact_url: String,
}

/// State shared by the support site handlers.
#[derive(Clone)]
pub struct SiteState {
    pub support: Arc<SupportService>,
    pub settings: Arc<SiteSettings>,
}

#[derive(Clone)]
pub struct StatusState {
    pub reconciler: Arc<StatusReconciler>,
}

/// Missing keys and `null`s are read as empty so that they surface as
/// "All fields are required." rather than a deserialization error.
#[derive(Debug, Default, Deserialize)]
pub struct SupportForm {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// `POST /api/support`
///
/// A body that is not a JSON object of strings (wrong content type, bad
/// syntax, non-string fields) is answered like an incomplete form.
pub async fn submit_support(
    State(state): State<SiteState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    form: Result<Json<SupportForm>, JsonRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let Json(form) = form.map_err(|rejection| {
        debug!(status = %rejection.status(), reason = %rejection.body_text(), "unreadable support form");
        ApiError::MissingFields
    })?;
    let request = SupportRequest {
        nickname: form.nickname.unwrap_or_default(),
        email: form.email.unwrap_or_default(),
        description: form.description.unwrap_or_default(),
        agent: header_str(&headers, header::USER_AGENT.as_str()).unwrap_or(MISSING_AGENT).to_string(),
        source_address: client_address(&headers, peer, state.settings.trust_forwarded_for),
    };

    state
        .support
        .submit(request)
        .await
        .map(|_| Json(MessageBody::new(ACCEPTED_MESSAGE)))
        .map_err(|e| ApiError::from_submission(e, &state.settings.ban_contact_url))
}

#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
}

/// `GET /api/status`
pub async fn bot_status(State(state): State<StatusState>) -> Json<StatusBody> {
    Json(StatusBody {
        status: state.reconciler.presence().label(),
    })
}

pub async fn healthz() -> &'static str {
    "ok"
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// First `X-Forwarded-For` hop when trusted, otherwise the socket peer.
pub fn client_address(headers: &HeaderMap, peer: SocketAddr, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = header_str(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(addr) = forwarded {
            return addr.to_string();
        }
    }
    peer.ip().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "10.0.0.5:41234".parse().unwrap()
    }

    #[test]
    fn forwarded_header_wins_when_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_address(&headers, peer(), true), "203.0.113.7");
        assert_eq!(client_address(&headers, peer(), false), "10.0.0.5");
    }

    #[test]
    fn blank_forwarded_header_falls_back_to_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" "));
        assert_eq!(client_address(&headers, peer(), true), "10.0.0.5");
    }
}
