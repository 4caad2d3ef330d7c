//! gido/crates/api-adapters/src/middleware.rs
//!
//! Layers shared by both routers: tracing, CORS and the static site.

use std::path::Path;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_status::SetStatus;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// One span per request; failures are 5xx only.
pub fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// The status page and support form are fetched cross-origin from the site.
///
/// An empty list allows any origin.
pub fn cors_policy(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}

/// Serves the site's assets; unknown paths get `errors/404/404.html`.
pub fn static_site(root: &Path) -> ServeDir<SetStatus<ServeFile>> {
    ServeDir::new(root).not_found_service(ServeFile::new(root.join("errors/404/404.html")))
}
