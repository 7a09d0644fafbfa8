use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log to stderr; stdout carries the JSON responses. `RUST_LOG` overrides the
/// default `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second initialisation (tests, embedding) is not an error worth failing on.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
