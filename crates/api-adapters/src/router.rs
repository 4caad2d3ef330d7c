use std::path::Path;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{bot_status, healthz, submit_support, SiteState, StatusState};
use crate::middleware::{cors_policy, static_site, trace_layer};

/// Support site: the form endpoint, plus the static assets when `static_dir`
/// is given.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()`; the
/// handler reads the peer address.
pub fn site_router(state: SiteState, static_dir: Option<&Path>, allowed_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/api/support", post(submit_support))
        .route("/healthz", get(healthz))
        .with_state(state);

    let app = match static_dir {
        Some(dir) => api.fallback_service(static_site(dir)),
        None => api,
    };

    app.layer(cors_policy(allowed_origins)).layer(trace_layer())
}

/// Status service: current presence of the companion bot.
pub fn status_router(state: StatusState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/api/status", get(bot_status))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(cors_policy(allowed_origins))
        .layer(trace_layer())
}
