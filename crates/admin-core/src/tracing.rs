//! # Observability
//!
//! Structured logging setup for the toolkit. Log levels are controlled via
//! the `RUST_LOG` environment variable; `info` gives compact operation logs,
//! `debug` additionally shows full request payloads.

/// Initializes the tracing subscriber. Call once at application startup.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
