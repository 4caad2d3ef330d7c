use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use auth_adapters::StaticBanList;
use axum::{
    body::{to_bytes, Body},
    extract::connect_info::MockConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use api_adapters::{site_router, SiteSettings, SiteState, MISSING_AGENT};
use domains::{BanList, DeliveryError, MockNotificationSink, SystemClock};
use serde_json::{json, Value};
use services::{abuse::default_window, derive_identity, AbuseNotifier, SupportService, SupportSettings};
use storage_adapters::MemoryAbuseLedger;
use tower::ServiceExt;

use doubles::RecordingSink;

/// Sink double that records payloads instead of asserting on them.
mod doubles {
    use super::*;
    use domains::{NotificationSink, WebhookMessage};

    #[derive(Default)]
    pub struct RecordingSink {
        pub received: Mutex<Vec<WebhookMessage>>,
    }

    #[async_trait::async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(&self, message: &WebhookMessage) -> Result<(), DeliveryError> {
            self.received.lock().unwrap().push(message.clone());
            Ok(())
        }
    }
}

const AGENT: &str = "test-agent";
const PEER: &str = "10.0.0.5:41234";

fn app(bans: BanList, support_sink: MockNotificationSink, abuse_sink: Arc<RecordingSink>) -> Router {
    let clock = Arc::new(SystemClock);
    let notifier = AbuseNotifier::new(
        Arc::new(MemoryAbuseLedger::new()),
        Some(abuse_sink),
        clock.clone(),
        default_window(),
    );
    let support = SupportService::new(
        Arc::new(StaticBanList::new(bans)),
        Arc::new(notifier),
        Arc::new(support_sink),
        clock,
        SupportSettings::default(),
    );
    let state = SiteState {
        support: Arc::new(support),
        settings: Arc::new(SiteSettings {
            trust_forwarded_for: true,
            ban_contact_url: "https://discord.gg/example".into(),
        }),
    };
    let peer: SocketAddr = PEER.parse().unwrap();
    site_router(state, None, &[]).layer(MockConnectInfo(peer))
}

fn support_request(body: Value, forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/support")
        .header("content-type", "application/json")
        .header("user-agent", AGENT);
    if let Some(addr) = forwarded_for {
        builder = builder.header("x-forwarded-for", addr);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn valid_form() -> Value {
    json!({ "nickname": "A", "email": "a@b.com", "description": "help" })
}

#[tokio::test]
async fn accepted_submission_returns_200() {
    let mut sink = MockNotificationSink::new();
    sink.expect_deliver().times(1).returning(|_| Ok(()));

    let response = app(BanList::default(), sink, Arc::default())
        .oneshot(support_request(valid_form(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["message"].as_str().unwrap().starts_with("Request submitted successfully"));
}

#[tokio::test]
async fn missing_field_returns_400_without_outbound_call() {
    let mut sink = MockNotificationSink::new();
    sink.expect_deliver().never();

    let response = app(BanList::default(), sink, Arc::default())
        .oneshot(support_request(json!({ "nickname": "A", "email": null }), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["message"], "All fields are required.");
}

#[tokio::test]
async fn body_without_json_content_type_returns_400() {
    let mut sink = MockNotificationSink::new();
    sink.expect_deliver().never();

    let request = Request::builder()
        .method("POST")
        .uri("/api/support")
        .header("user-agent", AGENT)
        .body(Body::from(valid_form().to_string()))
        .unwrap();
    let response = app(BanList::default(), sink, Arc::default())
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["message"], "All fields are required.");
}

#[tokio::test]
async fn non_string_or_malformed_fields_return_400() {
    for body in [
        Body::from(json!({ "nickname": 1, "email": "a@b.com", "description": "help" }).to_string()),
        Body::from("{\"nickname\": \"A\","),
    ] {
        let mut sink = MockNotificationSink::new();
        sink.expect_deliver().never();

        let request = Request::builder()
            .method("POST")
            .uri("/api/support")
            .header("content-type", "application/json")
            .header("user-agent", AGENT)
            .body(body)
            .unwrap();
        let response = app(BanList::default(), sink, Arc::default())
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["message"], "All fields are required.");
    }
}

#[tokio::test]
async fn sink_failure_returns_500() {
    let mut sink = MockNotificationSink::new();
    sink.expect_deliver()
        .returning(|_| Err(DeliveryError::Transport("connection reset".into())));

    let response = app(BanList::default(), sink, Arc::default())
        .oneshot(support_request(valid_form(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await["message"], "Failed to submit request.");
}

#[tokio::test]
async fn banned_forwarded_client_gets_403_and_one_abuse_alert() {
    let banned = derive_identity(AGENT, "203.0.113.7");
    let mut sink = MockNotificationSink::new();
    sink.expect_deliver().never();
    let abuse = Arc::new(RecordingSink::default());

    let app = app(BanList::new([banned.as_str()]), sink, abuse.clone());
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(support_request(valid_form(), Some("203.0.113.7, 10.0.0.1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = read_json(response).await;
        assert!(body["message"].as_str().unwrap().contains("https://discord.gg/example"));
    }

    // The alert is delivered on a background task.
    for _ in 0..50 {
        if !abuse.received.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let received = abuse.received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].embeds[0].fields[0].value, banned.as_str());
}

#[tokio::test]
async fn peer_address_is_used_without_forwarded_header() {
    let banned = derive_identity(AGENT, "10.0.0.5");
    let mut sink = MockNotificationSink::new();
    sink.expect_deliver().never();

    let response = app(BanList::new([banned.as_str()]), sink, Arc::default())
        .oneshot(support_request(valid_form(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_user_agent_hashes_as_undefined() {
    let banned = derive_identity(MISSING_AGENT, "10.0.0.5");
    let mut sink = MockNotificationSink::new();
    sink.expect_deliver().never();

    let request = Request::builder()
        .method("POST")
        .uri("/api/support")
        .header("content-type", "application/json")
        .body(Body::from(valid_form().to_string()))
        .unwrap();
    let response = app(BanList::new([banned.as_str()]), sink, Arc::default())
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn healthz_answers_ok() {
    let response = app(BanList::default(), MockNotificationSink::new(), Arc::default())
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
