//! WebSocket upgrade + message loop. Each connection owns one game session for
//! its lifetime. Client messages are parsed as JSON and forwarded to core
//! logic; we reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::logic::*;
use crate::protocol::{to_view, ClientWsMessage, ServerWsMessage};
use crate::session::GameSession;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "password_game", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let session_id = Uuid::new_v4().to_string();
  let mut session = state.fresh_session();
  info!(target: "password_game", %session_id, "WebSocket connected");

  while let Some(Ok(msg)) = socket.recv().await {
    let reply = match frame_reply(msg, &mut session, &session_id, &state) {
      FrameAction::Reply(reply) => reply,
      FrameAction::Ignore => continue,
      FrameAction::Close => break,
    };
    if let Err(e) = socket.send(reply).await {
      error!(target: "password_game", %session_id, error = %e, "WS send error");
      break;
    }
  }
  info!(target: "password_game", %session_id, levels_solved = session.history().len(), won = session.is_won(), "WebSocket disconnected");
}

/// What the connection loop does with one incoming frame.
#[derive(Debug, PartialEq)]
enum FrameAction {
  Reply(Message),
  Ignore,
  Close,
}

fn frame_reply(msg: Message, session: &mut GameSession, session_id: &str, state: &AppState) -> FrameAction {
  match msg {
    Message::Text(txt) => {
      // Parse, dispatch, serialize response.
      let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
        Ok(incoming) => handle_client_ws(incoming, session, session_id, state),
        Err(e) => {
          warn!(target: "password_game", %session_id, error = %e, "WS message rejected");
          ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }
        }
      };
      let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
        serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
      });
      FrameAction::Reply(Message::Text(out))
    }
    Message::Ping(payload) => FrameAction::Reply(Message::Pong(payload)),
    Message::Close(_) => FrameAction::Close,
    _ => FrameAction::Ignore,
  }
}

fn handle_client_ws(msg: ClientWsMessage, session: &mut GameSession, session_id: &str, state: &AppState) -> ServerWsMessage {
  let cfg = &state.config;
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::CurrentLevel => {
      debug!(target: "password_game", %session_id, "WS current_level");
      ServerWsMessage::Level { level: to_view(session_id, session, cfg) }
    }

    ClientWsMessage::SubmitAnswer { answer } => {
      let result = submit_answer(session, session_id, &answer, cfg);
      ServerWsMessage::AnswerResult { result }
    }

    ClientWsMessage::Restart => {
      ServerWsMessage::Level { level: restart_session(session, session_id, cfg) }
    }

    ClientWsMessage::ExpectedAnswer => match expected_answer(session, session_id, cfg) {
      Ok(out) => ServerWsMessage::Expected(out),
      Err(message) => ServerWsMessage::Error { message },
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::GameConfig;
  use crate::session::Verdict;

  #[test]
  fn dispatch_drives_the_connection_session() {
    let state = AppState::new(GameConfig::default());
    let mut session = state.fresh_session();

    let reply = handle_client_ws(ClientWsMessage::SubmitAnswer { answer: "password".into() }, &mut session, "ws1", &state);
    match reply {
      ServerWsMessage::AnswerResult { result } => {
        assert_eq!(result.outcome, Verdict::Correct);
        assert_eq!(result.level.level_number, 2);
      }
      other => panic!("unexpected reply: {:?}", other),
    }

    match handle_client_ws(ClientWsMessage::Restart, &mut session, "ws1", &state) {
      ServerWsMessage::Level { level } => assert_eq!(level.level_number, 1),
      other => panic!("unexpected reply: {:?}", other),
    }

    assert!(matches!(handle_client_ws(ClientWsMessage::Ping, &mut session, "ws1", &state), ServerWsMessage::Pong));
    assert!(matches!(
      handle_client_ws(ClientWsMessage::ExpectedAnswer, &mut session, "ws1", &state),
      ServerWsMessage::Error { .. }
    ));
  }

  #[test]
  fn frames_map_to_reply_or_loop_control() {
    let state = AppState::new(GameConfig::default());
    let mut session = state.fresh_session();

    let pong = frame_reply(Message::Ping(vec![7, 7]), &mut session, "ws2", &state);
    assert_eq!(pong, FrameAction::Reply(Message::Pong(vec![7, 7])));

    match frame_reply(Message::Text(r#"{"type":"ping"}"#.into()), &mut session, "ws2", &state) {
      FrameAction::Reply(Message::Text(txt)) => assert_eq!(txt, r#"{"type":"pong"}"#),
      other => panic!("unexpected action: {:?}", other),
    }

    match frame_reply(Message::Text("not json".into()), &mut session, "ws2", &state) {
      FrameAction::Reply(Message::Text(txt)) => assert!(txt.contains("Invalid JSON")),
      other => panic!("unexpected action: {:?}", other),
    }

    assert_eq!(frame_reply(Message::Pong(vec![]), &mut session, "ws2", &state), FrameAction::Ignore);
    assert_eq!(frame_reply(Message::Close(None), &mut session, "ws2", &state), FrameAction::Close);
  }
}
