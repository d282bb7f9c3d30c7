use crate::{
    auth::{AuthResult, JwtValidator},
    bank::QuestionSource,
    config::ServerSettings,
    dashboard::{AdminView, LiveSession, build_admin_view},
    handler::{admin::open_dashboard, player::open_session},
    leaderboard::{LeaderboardEntry, leaderboard},
    model::{
        client_message::{AdminAction, ClientMessage},
        roster::Roster,
        server_message::ServerMessage,
        session::{Phase, Session},
    },
    persistence::PersistenceClient,
    reconcile::reconcile,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use log::*;
use rand::Rng;
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::{Mutex, mpsc},
    task::AbortHandle,
};
use tokio_tungstenite::{
    WebSocketStream, accept_hdr_async,
    tungstenite::{
        Error, Message, Result,
        handshake::server::{ErrorResponse, Request, Response},
    },
};

pub type Tx = mpsc::UnboundedSender<Message>;
pub type Rx = mpsc::UnboundedReceiver<Message>;

/// A connected player and the session they drive.
pub struct PlayerSlot {
    pub session: Session,
    pub tx: Tx,
    pub timer_abort_handle: Option<AbortHandle>,
}

pub struct AppState {
    pub players: Mutex<HashMap<String, PlayerSlot>>,
    pub questions: QuestionSource,
    pub roster: Roster,
    pub store: PersistenceClient,
    pub validator: Arc<dyn JwtValidator>,
    pub settings: ServerSettings,
}

impl AppState {
    pub fn new(
        questions: QuestionSource,
        roster: Roster,
        store: PersistenceClient,
        validator: Arc<dyn JwtValidator>,
        settings: ServerSettings,
    ) -> Self {
        Self {
            players: Mutex::new(HashMap::new()),
            questions,
            roster,
            store,
            validator,
            settings,
        }
    }

    /// Top results for the public leaderboard, names reconciled first.
    pub async fn public_leaderboard(&self) -> anyhow::Result<Vec<LeaderboardEntry>> {
        let stored = self.store.list_results().await?;
        let reconciled = reconcile(&self.roster, &stored);
        Ok(leaderboard(
            &reconciled.results,
            &self.roster,
            self.settings.leaderboard_size,
        ))
    }

    pub async fn admin_view(&self) -> anyhow::Result<AdminView> {
        let stored = self.store.list_results().await?;
        let mut active: Vec<LiveSession> = {
            let players = self.players.lock().await;
            players
                .values()
                .filter(|slot| slot.session.phase() != Phase::NotStarted)
                .map(|slot| LiveSession::from_session(&slot.session))
                .collect()
        };
        active.sort_by(|a, b| a.player_name.cmp(&b.player_name));
        // The dashboard still works without the answer key.
        let bank = self.questions.get().await.ok();
        Ok(build_admin_view(
            &self.roster,
            &stored,
            active,
            bank.as_deref(),
            Utc::now(),
        ))
    }
}

pub fn generate_code() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphabetic)
        .take(6)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect()
}

fn token_from_query(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
}

fn authorize_admin(app_state: &AppState, token: Option<&str>) -> Result<AuthResult, String> {
    let Some(token) = token else {
        return Err("Authentication required: connect with a token".to_string());
    };
    match app_state.validator.validate(token) {
        Ok(auth) if auth.is_admin => Ok(auth),
        Ok(auth) => {
            warn!("User {} tried to open the dashboard without the admin role", auth.user_id);
            Err("User is not authorized as an admin".to_string())
        }
        Err(e) => {
            warn!("Rejected dashboard token: {e}");
            Err("Authentication required: invalid or expired token".to_string())
        }
    }
}

async fn send_error(ws_stream: &mut WebSocketStream<TcpStream>, message: String) -> Result<()> {
    ws_stream
        .send(Message::text(ServerMessage::error(message).to_text()))
        .await
}

async fn accept_connection(peer: SocketAddr, stream: TcpStream, app_state: Arc<AppState>) {
    if let Err(e) = handle_connection(stream, app_state).await {
        match e {
            Error::ConnectionClosed | Error::Protocol(_) | Error::Utf8(_) => (),
            err => error!("Error processing connection from {peer}: {err}"),
        }
    }
}

async fn handle_connection(stream: TcpStream, app_state: Arc<AppState>) -> Result<()> {
    let mut token = None;
    let mut ws_stream = accept_hdr_async(
        stream,
        |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            token = token_from_query(req.uri().query());
            Ok(resp)
        },
    )
    .await?;

    let Some(msg) = ws_stream.next().await else {
        return Ok(());
    };
    let msg = msg?;
    let Ok(text) = msg.to_text() else {
        return Ok(());
    };
    debug!("First message: {text}");

    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Player(action)) => {
            open_session(app_state, ws_stream, action).await;
        }
        Ok(ClientMessage::Admin(AdminAction::OpenDashboard)) => {
            match authorize_admin(&app_state, token.as_deref()) {
                Ok(auth) => open_dashboard(app_state, ws_stream, auth).await,
                Err(message) => send_error(&mut ws_stream, message).await?,
            }
        }
        Ok(ClientMessage::Admin(action)) => {
            error!("Expected OpenDashboard from new admin connection, instead got: {action:?}");
            send_error(
                &mut ws_stream,
                "First action must be OpenDashboard".to_string(),
            )
            .await?;
        }
        Err(e) => {
            warn!("Failed to parse message: {e}");
            send_error(&mut ws_stream, format!("Invalid JSON: {e}")).await?;
        }
    }

    Ok(())
}

pub async fn start_ws_server(listener: TcpListener, app_state: Arc<AppState>) {
    match listener.local_addr() {
        Ok(addr) => info!("Listening on: {addr}"),
        Err(e) => warn!("Listening on unknown address: {e}"),
    }

    while let Ok((stream, peer)) = listener.accept().await {
        info!("Peer address: {peer}");
        tokio::spawn(accept_connection(peer, stream, app_state.clone()));
    }
}
