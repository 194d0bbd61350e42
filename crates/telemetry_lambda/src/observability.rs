use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Installs the JSON log subscriber once per process.
///
/// `RUST_LOG` takes precedence over the configured level. CloudWatch stamps
/// every line on ingest, so the subscriber omits its own timestamp.
pub fn init_logging(log_level: &str) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_target(false)
                    .without_time(),
            )
            .init();
    });
}
