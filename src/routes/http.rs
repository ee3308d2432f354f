//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs the session id and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

fn unknown_session(session_id: &str) -> Response {
  warn!(target: "password_game", %session_id, "Unknown sessionId");
  (StatusCode::NOT_FOUND, Json(ErrorOut { message: format!("Unknown sessionId: {}", session_id) })).into_response()
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> Response {
  let id = state.create_session().await;
  let cfg = &state.config;
  match state.read_session(&id, |s| to_view(&id, s, cfg)).await {
    Some(view) => Json(view).into_response(),
    None => unknown_session(&id),
  }
}

#[instrument(level = "info", skip(state), fields(session_id = %q.session_id))]
pub async fn http_get_level(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SessionQuery>,
) -> Response {
  let cfg = &state.config;
  match state.read_session(&q.session_id, |s| to_view(&q.session_id, s, cfg)).await {
    Some(view) => Json(view).into_response(),
    None => unknown_session(&q.session_id),
  }
}

#[instrument(level = "info", skip(state, body), fields(session_id = %body.session_id, answer_len = body.answer.len()))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> Response {
  let cfg = &state.config;
  match state.with_session(&body.session_id, |s| submit_answer(s, &body.session_id, &body.answer, cfg)).await {
    Some(out) => {
      info!(target: "level", session_id = %body.session_id, won = out.won, "HTTP answer evaluated");
      Json(out).into_response()
    }
    None => unknown_session(&body.session_id),
  }
}

#[instrument(level = "info", skip(state, body), fields(session_id = %body.session_id))]
pub async fn http_post_restart(
  State(state): State<Arc<AppState>>,
  Json(body): Json<RestartIn>,
) -> Response {
  let cfg = &state.config;
  match state.with_session(&body.session_id, |s| restart_session(s, &body.session_id, cfg)).await {
    Some(view) => Json(view).into_response(),
    None => unknown_session(&body.session_id),
  }
}

#[instrument(level = "info", skip(state), fields(session_id = %q.session_id))]
pub async fn http_get_expected(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SessionQuery>,
) -> Response {
  let cfg = &state.config;
  match state.read_session(&q.session_id, |s| expected_answer(s, &q.session_id, cfg)).await {
    Some(Ok(out)) => Json(out).into_response(),
    Some(Err(message)) => (StatusCode::NOT_FOUND, Json(ErrorOut { message })).into_response(),
    None => unknown_session(&q.session_id),
  }
}

#[instrument(level = "info", skip(state), fields(session_id = %q.session_id))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SessionQuery>,
) -> Response {
  if state.remove_session(&q.session_id).await {
    Json(HealthOut { ok: true }).into_response()
  } else {
    unknown_session(&q.session_id)
  }
}
