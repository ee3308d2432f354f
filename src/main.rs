//! Password Game · Level Engine Backend
//!
//! - A ten-level sequential puzzle engine (catalog + session state machine)
//! - Axum HTTP + WebSocket API for the UI collaborator
//! - Static UI assets served from `static_dir` (if present)
//!
//! Important env variables:
//!   PORT             : u16 (default 3000)
//!   GAME_CONFIG_PATH : path to TOML config (hint policy, win message, debug)
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod catalog;
mod session;
mod config;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::config::load_game_config_from_env;
use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (catalog, config, in-memory HTTP sessions).
  let state = Arc::new(AppState::new(load_game_config_from_env()));

  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "password_game", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "password_game", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "password_game", error = %e, "Failed to listen for ctrl-c; running until killed");
    std::future::pending::<()>().await;
  }
}
