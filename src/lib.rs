//! A waitlist signup service: accepts signups over HTTP and stores them in Postgres.

pub mod app;
pub mod config;
mod error;
pub mod model;
pub mod web;

// re-exports
pub use app::{App, AppState};
pub use error::{Error, Result};
pub use web::serve::serve;

use tracing_subscriber::EnvFilter;

const DBG_DEFAULT_FILTER: &str = "debug";
const PRODUCTION_DEFAULT_FILTER: &str = "info";

/// Compact, human readable logs. Filter with `RUST_LOG`, defaults to `debug`.
pub fn init_dbg_tracing() {
    tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_env_filter(env_filter(DBG_DEFAULT_FILTER))
        .compact()
        .init();
}

/// JSON logs. Filter with `RUST_LOG`, defaults to `info`.
pub fn init_production_tracing() {
    tracing_subscriber::fmt()
        .json()
        .with_current_span(true)
        .with_env_filter(env_filter(PRODUCTION_DEFAULT_FILTER))
        .init();
}

fn env_filter(default: &str) -> EnvFilter {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_or_default(directives.as_deref(), default)
}

/// Unset or unparsable directives fall back to `default`.
fn filter_or_default(directives: Option<&str>, default: &str) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}
