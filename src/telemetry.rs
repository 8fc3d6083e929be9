//! Telemetry and Observability
//!
//! Structured logging setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,platform_service=debug,sqlx=warn,tower_http=debug";

/// Initialize the tracing subscriber with human-readable output
pub fn init_tracing() {
    init_tracing_with("pretty");
}

/// Initialize the tracing subscriber; `"json"` selects JSON lines, anything
/// else the pretty formatter
pub fn init_tracing_with(format: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let registry = tracing_subscriber::registry().with(env_filter);
    if format.eq_ignore_ascii_case("json") {
        registry.with(fmt_layer.json()).init();
    } else {
        registry.with(fmt_layer).init();
    }

    tracing::info!(format, "Tracing initialized");
}
