use crate::{
    heartbeat::{Heartbeat, PING_INTERVAL},
    model::{
        client_message::{ClientMessage, PlayerAction},
        result::SubmittedResult,
        server_message::{NoticeLevel, ServerMessage, send_msg},
        session::{Session, SessionError, SubmitOutcome},
    },
    server::{AppState, PlayerSlot, Rx, Tx, generate_code},
    session_timer::{start_timer, stop_timer},
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use log::*;
use std::sync::Arc;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{WebSocketStream, tungstenite::Message};

/// Create a session for a new player connection and run it until the player
/// disconnects. `first_action` is the message that opened the connection.
pub async fn open_session(
    app_state: Arc<AppState>,
    mut ws_stream: WebSocketStream<TcpStream>,
    first_action: PlayerAction,
) {
    let bank = match app_state.questions.get().await {
        Ok(bank) => bank,
        Err(e) => {
            error!("Cannot open a session without questions: {e:#}");
            let msg = ServerMessage::error("Failed to load questions. Please try again later.");
            let _ = ws_stream.send(Message::text(msg.to_text())).await;
            return;
        }
    };

    let (tx, rx) = mpsc::unbounded_channel::<Message>();
    let session = Session::new(
        Arc::from(bank.questions.as_slice()),
        app_state.settings.session_settings(&bank),
    );

    let session_id = {
        let mut players = app_state.players.lock().await;
        let mut session_id = generate_code();
        while players.contains_key(&session_id) {
            session_id = generate_code();
        }
        players.insert(
            session_id.clone(),
            PlayerSlot {
                session,
                tx: tx.clone(),
                timer_abort_handle: None,
            },
        );
        session_id
    };
    info!("Opened session {session_id}");

    process_player_action(first_action, &app_state, &session_id, &tx).await;
    handle_player(ws_stream, app_state, rx, tx, session_id).await;
}

/// Result of processing a player action: messages to send after releasing the lock
struct PlayerActionResult {
    messages: Vec<ServerMessage>,
    /// A freshly completed result that still has to be stored.
    completed: Option<SubmittedResult>,
}

impl PlayerActionResult {
    fn reply(messages: Vec<ServerMessage>) -> Self {
        Self {
            messages,
            completed: None,
        }
    }

    fn error(e: SessionError) -> Self {
        Self::reply(vec![ServerMessage::error(e.to_string())])
    }
}

fn session_state(slot: &PlayerSlot) -> ServerMessage {
    ServerMessage::SessionState {
        state: slot.session.to_view(),
    }
}

/// Apply a player action to their session.
/// The slot must be held under the players lock; this function does not await.
fn apply_player_action(
    action: PlayerAction,
    slot: &mut PlayerSlot,
    app_state: &Arc<AppState>,
    session_id: &str,
) -> PlayerActionResult {
    match action {
        PlayerAction::StartQuiz { player_name } => match slot.session.start(&player_name) {
            Ok(()) => {
                info!("Session {session_id} started by {}", slot.session.player_name());
                start_timer(slot, app_state, session_id);
                PlayerActionResult::reply(vec![session_state(slot)])
            }
            // Blank names leave the session untouched.
            Err(SessionError::EmptyName) => {
                warn!("Session {session_id} tried to start without a name");
                PlayerActionResult::reply(vec![session_state(slot)])
            }
            Err(e) => PlayerActionResult::error(e),
        },

        PlayerAction::SelectAnswer {
            question_index,
            option_index,
        } => match slot.session.set_answer(question_index, option_index) {
            Ok(()) => PlayerActionResult::reply(vec![session_state(slot)]),
            Err(e) => PlayerActionResult::error(e),
        },

        PlayerAction::NextQuestion => match slot.session.advance() {
            Ok(()) => PlayerActionResult::reply(vec![session_state(slot)]),
            Err(e) => PlayerActionResult::error(e),
        },

        PlayerAction::PrevQuestion => match slot.session.retreat() {
            Ok(()) => PlayerActionResult::reply(vec![session_state(slot)]),
            Err(e) => PlayerActionResult::error(e),
        },

        PlayerAction::UseHint => match slot.session.use_hint() {
            Ok(remaining) => PlayerActionResult::reply(vec![
                session_state(slot),
                ServerMessage::notice(
                    NoticeLevel::Success,
                    format!("Hint revealed! {remaining} hints remaining"),
                ),
            ]),
            Err(e) => PlayerActionResult::error(e),
        },

        PlayerAction::SubmitQuiz => match slot.session.submit(Utc::now()) {
            Ok(SubmitOutcome::ConfirmationRequired) => PlayerActionResult::reply(vec![
                session_state(slot),
                ServerMessage::notice(
                    NoticeLevel::Warning,
                    "Press submit again to confirm your final answers",
                ),
            ]),
            Ok(SubmitOutcome::Completed(result)) => {
                info!(
                    "Session {session_id} submitted by {} with score {}/{}",
                    result.user_name, result.score, result.total_questions
                );
                stop_timer(slot);
                PlayerActionResult {
                    messages: vec![
                        session_state(slot),
                        ServerMessage::notice(NoticeLevel::Success, "Quiz submitted successfully!"),
                    ],
                    completed: slot.session.take_unpersisted_result(),
                }
            }
            Err(e) => PlayerActionResult::error(e),
        },

        PlayerAction::ResetQuiz => match slot.session.reset() {
            Ok(()) => {
                stop_timer(slot);
                PlayerActionResult::reply(vec![session_state(slot)])
            }
            Err(e) => PlayerActionResult::error(e),
        },
    }
}

async fn process_player_action(
    action: PlayerAction,
    app_state: &Arc<AppState>,
    session_id: &str,
    player_tx: &Tx,
) {
    // Acquire lock, mutate state, collect messages to send, then release lock
    let result = {
        let mut players = app_state.players.lock().await;
        let Some(slot) = players.get_mut(session_id) else {
            error!("Session {session_id} not found while processing player action");
            return;
        };
        apply_player_action(action, slot, app_state, session_id)
    };
    // Lock released here

    for msg in result.messages {
        if let ServerMessage::Error { message } = &msg {
            warn!("Sending error response '{message}' back to session {session_id}");
        }
        send_msg(player_tx, msg);
    }

    if let Some(completed) = result.completed {
        persist_result(app_state, player_tx, completed).await;
    }
}

async fn process_player_message(
    text: &str,
    app_state: &Arc<AppState>,
    session_id: &str,
    player_tx: &Tx,
) {
    // Parse message before acquiring lock
    let action = match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Player(action)) => action,
        Ok(_) => {
            warn!("Got unexpected message type when Player message expected");
            send_msg(
                player_tx,
                ServerMessage::error("Unexpected message type: expected Player message"),
            );
            return;
        }
        Err(e) => {
            warn!("Failed to parse message: {text}");
            warn!("Error: {e}");
            send_msg(player_tx, ServerMessage::error(format!("Invalid JSON: {e}")));
            return;
        }
    };

    process_player_action(action, app_state, session_id, player_tx).await;
}

/// Store a completed result, tell the player how that went, then send them
/// the refreshed leaderboard. Storage failures never touch the session.
pub async fn persist_result(app_state: &AppState, player_tx: &Tx, result: SubmittedResult) {
    let is_admin = app_state.roster.is_admin_name(&result.user_name);
    match app_state.store.insert_result(&result, is_admin).await {
        Ok(()) => send_msg(
            player_tx,
            ServerMessage::notice(NoticeLevel::Success, "Your result has been saved!"),
        ),
        Err(e) => {
            error!("Failed to save result for {}: {e:#}", result.user_name);
            send_msg(
                player_tx,
                ServerMessage::notice(
                    NoticeLevel::Error,
                    "Failed to save your result. Please tell the administrator.",
                ),
            );
        }
    }

    match app_state.public_leaderboard().await {
        Ok(entries) => send_msg(player_tx, ServerMessage::Leaderboard { entries }),
        Err(e) => {
            error!("Failed to load leaderboard: {e:#}");
            send_msg(
                player_tx,
                ServerMessage::notice(NoticeLevel::Error, "Failed to load leaderboard"),
            );
        }
    }
}

async fn handle_player(
    ws_stream: WebSocketStream<TcpStream>,
    app_state: Arc<AppState>,
    mut rx: Rx,
    player_tx: Tx,
    session_id: String,
) {
    let (mut ws_write, mut ws_read) = ws_stream.split();
    let mut heartbeat = Heartbeat::new();
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);

    loop {
        tokio::select! {
            // Outgoing messages from channel
            Some(msg) = rx.recv() => {
                if ws_write.send(msg).await.is_err() {
                    break;
                }
            }

            // Incoming messages from WebSocket
            msg_result = ws_read.next() => {
                match msg_result {
                    Some(Ok(Message::Pong(_))) => {
                        heartbeat.record_pong();
                    }
                    Some(Ok(Message::Text(text))) => {
                        info!("Received message: {text}");
                        process_player_message(&text, &app_state, &session_id, &player_tx).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Err(_)) => {
                        break;
                    }
                    _ => {} // Ignore Ping (auto-handled by tungstenite), Binary
                }
            }

            // Heartbeat ping timer
            _ = ping_interval.tick() => {
                if !heartbeat.is_alive() {
                    info!("Session {session_id} connection timed out (no pong received)");
                    break;
                }
                if ws_write.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }
        }
    }

    // Player disconnected - drop the session and its countdown
    info!("Session {session_id} disconnected");
    let mut players = app_state.players.lock().await;
    if let Some(mut slot) = players.remove(&session_id) {
        stop_timer(&mut slot);
    }
}
