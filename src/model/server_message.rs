use log::{debug, error};
use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::Message;

use crate::dashboard::AdminView;
use crate::leaderboard::LeaderboardEntry;
use crate::model::session::SessionView;
use crate::server::Tx;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    SessionState { state: SessionView },

    #[serde(rename_all = "camelCase")]
    TimerTick { seconds_remaining: u32 },

    /// Transient, user-facing information; never changes state.
    #[serde(rename_all = "camelCase")]
    Notice { level: NoticeLevel, message: String },

    #[serde(rename_all = "camelCase")]
    Leaderboard { entries: Vec<LeaderboardEntry> },

    #[serde(rename_all = "camelCase")]
    AdminView { view: AdminView },

    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        ServerMessage::Notice {
            level,
            message: message.into(),
        }
    }

    pub fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!("Catastrophic! Serde error when trying to serialize serverside: {e}")
        })
    }
}

pub fn send_msg(tx: &Tx, msg: ServerMessage) {
    debug!("Sending server message: {msg:?}");
    let msg = msg.to_text();
    tx.send(Message::text(&msg)).unwrap_or_else(|e| {
        error!("Sending server message through channel failed: {e}");
        error!("Tried to send message: {msg}");
    })
}
