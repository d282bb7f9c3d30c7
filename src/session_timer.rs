use crate::handler::player::persist_result;
use crate::model::result::SubmittedResult;
use crate::model::server_message::{NoticeLevel, ServerMessage, send_msg};
use crate::model::session::TickOutcome;
use crate::server::{AppState, PlayerSlot};
use chrono::Utc;
use log::{error, info};
use std::sync::Arc;

fn expiry_notice(result: &SubmittedResult) -> ServerMessage {
    if result.answers.iter().any(Option::is_none) {
        ServerMessage::notice(
            NoticeLevel::Warning,
            "Time's up! Your quiz was submitted with unanswered questions.",
        )
    } else {
        ServerMessage::notice(
            NoticeLevel::Warning,
            "Time's up! Your quiz was submitted automatically.",
        )
    }
}

/// Spawn the countdown for a session that just started. Called while holding
/// the players lock.
pub fn start_timer(slot: &mut PlayerSlot, app_state: &Arc<AppState>, session_id: &str) {
    stop_timer(slot);

    if slot.session.time_remaining() == 0 {
        return;
    }

    let app_state2 = app_state.clone();
    let session_id2 = session_id.to_string();
    let tick_interval = app_state.settings.tick_interval;

    let task = tokio::spawn(async move {
        loop {
            tokio::time::sleep(tick_interval).await;

            // Lock, tick, and either report the time left or finish the session
            let (tx, final_state, result) = {
                let mut players = app_state2.players.lock().await;
                let Some(slot) = players.get_mut(&session_id2) else {
                    error!("Tried to tick session timer, but session {session_id2} no longer exists!");
                    break;
                };

                match slot.session.tick(Utc::now()) {
                    Ok(TickOutcome::Running { seconds_remaining }) => {
                        send_msg(&slot.tx, ServerMessage::TimerTick { seconds_remaining });
                        continue;
                    }
                    Ok(TickOutcome::Expired(_)) => {
                        slot.timer_abort_handle = None;
                        let final_state = slot.session.to_view();
                        let result = slot.session.take_unpersisted_result();
                        (slot.tx.clone(), final_state, result)
                    }
                    Err(e) => {
                        error!("Tried to tick session timer for {session_id2}: {e}");
                        slot.timer_abort_handle = None;
                        break;
                    }
                }
            };
            // Lock released

            info!("Time ran out for session {session_id2}");
            send_msg(&tx, ServerMessage::SessionState { state: final_state });
            if let Some(result) = result {
                send_msg(&tx, expiry_notice(&result));
                persist_result(&app_state2, &tx, result).await;
            }
            break;
        }
    });

    slot.timer_abort_handle = Some(task.abort_handle());
}

/// Cancel the countdown, if any. Called while holding the players lock.
pub fn stop_timer(slot: &mut PlayerSlot) {
    if let Some(handle) = slot.timer_abort_handle.take() {
        handle.abort();
    }
}
