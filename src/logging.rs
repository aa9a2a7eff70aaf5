use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Console logging, filtered by `RUST_LOG` (defaults to info for this crate).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sentry_exporter=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .init();
}
