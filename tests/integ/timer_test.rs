use std::time::Duration;

use crate::{TestClient, TestServer};

use quiz_backend::config::ServerSettings;
use quiz_backend::model::client_message::PlayerAction;
use quiz_backend::model::server_message::{NoticeLevel, ServerMessage};
use quiz_backend::model::session::Phase;

fn fast_settings(time_budget_secs: u32) -> ServerSettings {
    ServerSettings {
        time_budget_secs: Some(time_budget_secs),
        tick_interval: Duration::from_millis(50),
        ..ServerSettings::default()
    }
}

#[tokio::test]
async fn timer_ticks_down_and_auto_submits() {
    let server = TestServer::start_with_settings(fast_settings(4)).await;
    let (mut player, state) = TestClient::start_quiz(&server, "Anri").await;
    assert_eq!(state.time_remaining, 4);

    player
        .send_player(PlayerAction::SelectAnswer {
            question_index: 0,
            option_index: 0,
        })
        .await;

    let mut ticks = Vec::new();
    let final_state = loop {
        match player.recv_json::<ServerMessage>().await {
            ServerMessage::TimerTick { seconds_remaining } => ticks.push(seconds_remaining),
            ServerMessage::SessionState { state } if state.phase == Phase::Completed => break state,
            ServerMessage::SessionState { .. } => {}
            other => panic!("Unexpected message before expiry: {other:?}"),
        }
    };

    assert!(ticks.windows(2).all(|w| w[0] > w[1]), "Ticks count down: {ticks:?}");
    assert!(ticks.iter().all(|&t| t > 0 && t < 4));
    assert!(final_state.submitted);
    assert_eq!(final_state.time_remaining, 0);

    let result = final_state.summary.unwrap().result;
    assert_eq!(result.score, 1);
    assert_eq!(result.time_elapsed, 4);
    assert_eq!(result.answers, vec![Some(0), None, None]);

    match player.recv().await {
        ServerMessage::Notice { level, message } => {
            assert_eq!(level, NoticeLevel::Warning);
            assert!(message.contains("Time's up"), "Got: {message}");
            assert!(message.contains("unanswered"), "Got: {message}");
        }
        other => panic!("Expected Notice, got {other:?}"),
    }
    match player.recv().await {
        ServerMessage::Notice { level, .. } => assert_eq!(level, NoticeLevel::Success),
        other => panic!("Expected Notice, got {other:?}"),
    }
    match player.recv().await {
        ServerMessage::Leaderboard { entries } => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].name, "ANRI RACHMAN");
        }
        other => panic!("Expected Leaderboard, got {other:?}"),
    }

    let stored = server.app_state.store.list_results().await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn explicit_submission_stops_the_timer() {
    let server = TestServer::start_with_settings(fast_settings(20)).await;
    let (mut player, _) = TestClient::start_quiz(&server, "Anri").await;
    player.answer_all(&[0, 1, 2]).await;
    let done = player.submit_confirmed().await;
    let elapsed = done.summary.unwrap().result.time_elapsed;
    assert!(elapsed < 20);

    // Well past the original budget
    tokio::time::sleep(Duration::from_millis(1200)).await;

    let stored = server.app_state.store.list_results().await.unwrap();
    assert_eq!(stored.len(), 1, "Result is stored exactly once");
    assert_eq!(stored[0].result.time_elapsed, elapsed);

    let players = server.app_state.players.lock().await;
    let slot = players.values().next().unwrap();
    assert!(slot.timer_abort_handle.is_none());
    assert_eq!(slot.session.phase(), Phase::Completed);
}
