//! # api-adapters
//!
//! HTTP surface of both services.
//!
//! The support site mounts `POST /api/support` next to the static assets;
//! the status service only exposes `GET /api/status`. Both answer
//! `GET /healthz`.

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
mod router;
#[cfg(feature = "web-axum")]
mod shutdown;

#[cfg(feature = "web-axum")]
pub use handlers::{SiteSettings, SiteState, StatusState, MISSING_AGENT};
#[cfg(feature = "web-axum")]
pub use router::{site_router, status_router};
#[cfg(feature = "web-axum")]
pub use shutdown::shutdown_signal;
