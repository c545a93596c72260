//! Tracing and logging configuration for the application
//!
//! Pretty output while developing against the Endaoment dev environment,
//! flattened JSON in production.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Environment;

/// Initialize tracing/logging based on the environment
///
/// # Development Mode
/// - Pretty-printed, human-readable logs with file and line numbers
/// - Default level: DEBUG for this crate and `tower_http`
///
/// # Production Mode
/// - JSON-formatted structured logs, one object per event
/// - Default level: INFO
/// - Request IDs and upstream operation names as structured fields
///
/// # Environment Variables
/// - `RUST_LOG`: Override default log level (e.g., `RUST_LOG=debug,reqwest=trace`)
pub fn init_tracing(env: &Environment) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(env)));

    if env.is_development() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .pretty()
                    .with_filter(env_filter),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .flatten_event(true)
                    .with_target(true)
                    .with_filter(env_filter),
            )
            .init();
    }

    tracing::info!(environment = ?env, "Tracing initialized");
}

const fn default_directives(env: &Environment) -> &'static str {
    match env {
        Environment::Development => "info,ndao_api=debug,serv=debug,tower_http=debug",
        Environment::Production => "info,tower_http=info,hyper_util=warn,reqwest=warn",
    }
}
