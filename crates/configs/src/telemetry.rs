//! Subscriber setup shared by both binaries.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{LogConfig, LogFormat};

/// Installs the global subscriber. `RUST_LOG` wins over `log.filter`.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry().with(filter).with(fmt::layer()).init(),
    }
}

/// Logs panics through tracing and terminates the process, background tasks included.
pub fn exit_on_panic() {
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "unrecoverable panic, exiting");
        std::process::exit(1);
    }));
}
