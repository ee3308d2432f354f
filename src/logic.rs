//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! Everything here works on a `&mut GameSession`, so the same code serves the
//! per-connection WebSocket session and the sessions kept in `AppState`.

use tracing::{info, instrument, warn};

use crate::config::GameConfig;
use crate::protocol::{to_submit_out, to_view, ExpectedOut, LevelView, SubmitOut};
use crate::session::{GameSession, Verdict};

#[instrument(level = "info", skip(session, cfg, answer), fields(%session_id, answer_len = answer.len()))]
pub fn submit_answer(session: &mut GameSession, session_id: &str, answer: &str, cfg: &GameConfig) -> SubmitOut {
  let number = session.current_level_number();
  let outcome = session.submit(answer);
  info!(
    target: "level",
    %session_id,
    level_number = number,
    correct = outcome.verdict == Verdict::Correct,
    hint_visible = outcome.hint_visible,
    won = outcome.won,
    "Answer evaluated"
  );
  to_submit_out(&outcome, to_view(session_id, session, cfg), cfg)
}

#[instrument(level = "info", skip(session, cfg), fields(%session_id))]
pub fn restart_session(session: &mut GameSession, session_id: &str, cfg: &GameConfig) -> LevelView {
  session.restart();
  to_view(session_id, session, cfg)
}

/// Expected-answer description for the active level plus a state snapshot, gated on `cfg.debug`.
#[instrument(level = "info", skip(session, cfg), fields(%session_id))]
pub fn expected_answer(session: &GameSession, session_id: &str, cfg: &GameConfig) -> Result<ExpectedOut, String> {
  if !cfg.debug {
    warn!(target: "password_game", %session_id, "Expected answer requested with debug disabled");
    return Err("Expected answers are only available in debug mode.".into());
  }
  let expected = session
    .expected_answer()
    .ok_or_else(|| "No active level: the game is already won.".to_string())?;
  Ok(ExpectedOut { expected, snapshot: session.snapshot().clone() })
}
