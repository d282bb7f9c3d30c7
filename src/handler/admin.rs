use crate::{
    auth::AuthResult,
    heartbeat::{Heartbeat, PING_INTERVAL},
    model::{
        client_message::{AdminAction, ClientMessage},
        server_message::{ServerMessage, send_msg},
    },
    server::{AppState, Rx, Tx},
};
use futures_util::{SinkExt, StreamExt};
use log::*;
use std::sync::Arc;
use tokio::{net::TcpStream, sync::mpsc, time::Instant};
use tokio_tungstenite::{WebSocketStream, tungstenite::Message};

/// Serve the results dashboard to an authenticated admin.
pub async fn open_dashboard(
    app_state: Arc<AppState>,
    ws_stream: WebSocketStream<TcpStream>,
    auth: AuthResult,
) {
    info!("Admin {} opened the dashboard", auth.user_id);
    let (tx, rx) = mpsc::unbounded_channel::<Message>();
    send_admin_view(&app_state, &tx).await;
    handle_admin(ws_stream, app_state, rx, tx, auth.user_id).await;
}

async fn send_admin_view(app_state: &AppState, admin_tx: &Tx) {
    match app_state.admin_view().await {
        Ok(view) => send_msg(admin_tx, ServerMessage::AdminView { view }),
        Err(e) => {
            error!("Failed to build admin view: {e:#}");
            send_msg(
                admin_tx,
                ServerMessage::error(format!("Failed to load results: {e}")),
            );
        }
    }
}

async fn process_admin_message(text: &str, app_state: &Arc<AppState>, admin_tx: &Tx) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Admin(AdminAction::RefreshResults)) => {
            send_admin_view(app_state, admin_tx).await;
        }
        Ok(ClientMessage::Admin(AdminAction::OpenDashboard)) => {
            send_msg(admin_tx, ServerMessage::error("Dashboard already open"));
        }
        Ok(_) => {
            warn!("Got unexpected message type when Admin message expected");
            send_msg(
                admin_tx,
                ServerMessage::error("Unexpected message type: expected Admin message"),
            );
        }
        Err(e) => {
            warn!("Failed to parse message: {text}");
            warn!("Error: {e}");
            send_msg(admin_tx, ServerMessage::error(format!("Invalid JSON: {e}")));
        }
    }
}

async fn handle_admin(
    ws_stream: WebSocketStream<TcpStream>,
    app_state: Arc<AppState>,
    mut rx: Rx,
    admin_tx: Tx,
    user_id: String,
) {
    let (mut ws_write, mut ws_read) = ws_stream.split();
    let mut heartbeat = Heartbeat::new();
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    let refresh_period = app_state.settings.refresh_interval;
    // The initial view was already sent, so the first refresh waits a full period.
    let mut refresh_interval = tokio::time::interval_at(Instant::now() + refresh_period, refresh_period);

    loop {
        tokio::select! {
            Some(msg) = rx.recv() => {
                if ws_write.send(msg).await.is_err() {
                    break;
                }
            }

            msg_result = ws_read.next() => {
                match msg_result {
                    Some(Ok(Message::Pong(_))) => {
                        heartbeat.record_pong();
                    }
                    Some(Ok(Message::Text(text))) => {
                        info!("Received message: {text}");
                        process_admin_message(&text, &app_state, &admin_tx).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Err(_)) => {
                        break;
                    }
                    _ => {}
                }
            }

            _ = refresh_interval.tick() => {
                debug!("Refreshing dashboard for {user_id}");
                send_admin_view(&app_state, &admin_tx).await;
            }

            _ = ping_interval.tick() => {
                if !heartbeat.is_alive() {
                    info!("Admin {user_id} connection timed out (no pong received)");
                    break;
                }
                if ws_write.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }
        }
    }

    info!("Admin {user_id} closed the dashboard");
}
