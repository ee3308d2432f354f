//! Loading game configuration (hint policy + presentation settings) from TOML.
//!
//! Every field is optional; see `GameConfig::default` for the values used when
//! a field (or the whole file) is missing.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::session::DEFAULT_HINT_THRESHOLD;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GameConfig {
  /// Failures on one level before its hint is shown. Values below 1 act as 1.
  pub hint_threshold: u32,
  /// Prepended to hint text in responses.
  pub hint_prefix: String,
  /// Prompt shown once every level is solved.
  pub win_message: String,
  /// How long the UI should wait before rendering the next level.
  /// Presentation only; the engine never waits.
  pub advance_delay_ms: u64,
  /// Enables the expected-answer endpoint.
  pub debug: bool,
  /// Directory holding the UI assets.
  pub static_dir: String,
  /// Upper bound on stored HTTP sessions. Values below 1 act as 1.
  pub max_sessions: usize,
  /// Stored sessions untouched for longer than this are dropped. 0 disables.
  pub session_idle_secs: u64,
}

impl Default for GameConfig {
  fn default() -> Self {
    Self {
      hint_threshold: DEFAULT_HINT_THRESHOLD,
      hint_prefix: "Hint: ".into(),
      win_message: "You win! 🎉".into(),
      advance_delay_ms: 550,
      debug: false,
      static_dir: "./static".into(),
      max_sessions: 1000,
      session_idle_secs: 1800,
    }
  }
}

impl GameConfig {
  pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
    toml::from_str::<GameConfig>(s)
  }

  pub fn session_idle(&self) -> Option<Duration> {
    (self.session_idle_secs > 0).then(|| Duration::from_secs(self.session_idle_secs))
  }

  /// Format a hint the way responses carry it.
  pub fn format_hint(&self, hint: &str) -> String {
    format!("{}{}", self.hint_prefix, hint)
  }
}

/// Load `GameConfig` from GAME_CONFIG_PATH. Missing variable, IO or parse errors fall back to defaults.
pub fn load_game_config_from_env() -> GameConfig {
  let Ok(path) = std::env::var("GAME_CONFIG_PATH") else {
    info!(target: "password_game", "GAME_CONFIG_PATH not set; using default config");
    return GameConfig::default();
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => match GameConfig::from_toml(&s) {
      Ok(cfg) => {
        info!(target: "password_game", %path, hint_threshold = cfg.hint_threshold, debug = cfg.debug, "Loaded game config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "password_game", %path, error = %e, "Failed to parse TOML config; using defaults");
        GameConfig::default()
      }
    },
    Err(e) => {
      error!(target: "password_game", %path, error = %e, "Failed to read TOML config file; using defaults");
      GameConfig::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_yields_defaults() {
    let cfg = GameConfig::from_toml("").unwrap();
    assert_eq!(cfg.hint_threshold, 3);
    assert_eq!(cfg.hint_prefix, "Hint: ");
    assert_eq!(cfg.win_message, "You win! 🎉");
    assert_eq!(cfg.advance_delay_ms, 550);
    assert!(!cfg.debug);
    assert_eq!(cfg.max_sessions, 1000);
    assert_eq!(cfg.session_idle(), Some(Duration::from_secs(1800)));
  }

  #[test]
  fn zero_idle_secs_disables_expiry() {
    let cfg = GameConfig::from_toml("session_idle_secs = 0\nmax_sessions = 50\n").unwrap();
    assert_eq!(cfg.session_idle(), None);
    assert_eq!(cfg.max_sessions, 50);
  }

  #[test]
  fn partial_file_overrides_only_given_fields() {
    let cfg = GameConfig::from_toml("hint_threshold = 5\ndebug = true\n").unwrap();
    assert_eq!(cfg.hint_threshold, 5);
    assert!(cfg.debug);
    assert_eq!(cfg.static_dir, "./static");
  }

  #[test]
  fn wrong_types_are_rejected() {
    assert!(GameConfig::from_toml("hint_threshold = \"three\"").is_err());
  }

  #[test]
  fn hint_is_prefixed() {
    let cfg = GameConfig::default();
    assert_eq!(cfg.format_hint("Reverse it."), "Hint: Reverse it.");
  }
}
