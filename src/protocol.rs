//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::session::{GameSession, SessionState, SubmitOutcome, Verdict};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    CurrentLevel,
    SubmitAnswer { answer: String },
    Restart,
    ExpectedAnswer,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Level { level: LevelView },
    AnswerResult { result: SubmitOut },
    Expected(ExpectedOut),
    Error { message: String },
}

/// DTO used by both WS and HTTP to describe the active level.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LevelView {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_id: Option<String>,
    pub prompt: String,
    pub level_number: usize,
    pub total_levels: usize,
    pub hint_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint_text: Option<String>,
    pub won: bool,
    pub advance_delay_ms: u64,
}

/// Convert a session into the public level DTO.
pub fn to_view(session_id: &str, session: &GameSession, cfg: &GameConfig) -> LevelView {
    LevelView {
        session_id: session_id.to_string(),
        level_id: session.current_level().map(|l| l.id.to_string()),
        prompt: session
            .current_prompt()
            .unwrap_or_else(|| cfg.win_message.clone()),
        level_number: session.current_level_number(),
        total_levels: session.total_levels(),
        hint_visible: session.hint_visible(),
        hint_text: session.current_hint().map(|h| cfg.format_hint(h)),
        won: session.is_won(),
        advance_delay_ms: cfg.advance_delay_ms,
    }
}

/// Result of one submission plus the level to render next.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOut {
    pub outcome: Verdict,
    pub hint_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint_text: Option<String>,
    pub won: bool,
    pub level: LevelView,
}

pub fn to_submit_out(outcome: &SubmitOutcome, level: LevelView, cfg: &GameConfig) -> SubmitOut {
    SubmitOut {
        outcome: outcome.verdict,
        hint_visible: outcome.hint_visible,
        hint_text: outcome.hint_text.map(|h| cfg.format_hint(h)),
        won: outcome.won,
        level,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct RestartIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Debug view: what the active level accepts plus the raw session state.
#[derive(Debug, Serialize)]
pub struct ExpectedOut {
    pub expected: String,
    pub snapshot: SessionState,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}
