//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "info,level=debug,password_game=debug,tower_http=info,axum=info").
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Targets: `password_game` for process and transport events, `level` for
//! engine progression (advance, rejection, hint disclosure, win, restart).

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,level=debug,password_game=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Choose JSON vs pretty; don't try to store different layer types.
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => {
            builder.json().init();
        }
        _ => {
            builder.init();
        }
    }
}
