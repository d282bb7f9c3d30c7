use crate::{TestClient, TestServer};

use quiz_backend::model::client_message::PlayerAction;
use quiz_backend::model::session::Phase;

#[tokio::test]
async fn reset_requires_a_completed_quiz() {
    let server = TestServer::start().await;
    let (mut player, _) = TestClient::start_quiz(&server, "Anri").await;

    player.send_player(PlayerAction::ResetQuiz).await;
    assert_eq!(player.recv_error().await, "Quiz has not been completed");
}

#[tokio::test]
async fn reset_starts_over_and_keeps_stored_results() {
    let server = TestServer::start().await;
    let (mut player, _) = TestClient::start_quiz(&server, "Anri").await;
    player.send_player(PlayerAction::UseHint).await;
    let _ = player.recv_state().await;
    let _notice = player.recv().await;
    player.answer_all(&[0, 1, 2]).await;
    player.submit_confirmed().await;
    for _ in 0..3 {
        let _ = player.recv().await; // notices and leaderboard
    }

    player.send_player(PlayerAction::ResetQuiz).await;
    let state = player.recv_state().await;
    assert_eq!(state.phase, Phase::NotStarted);
    assert_eq!(state.answers, vec![None, None, None]);
    assert_eq!(state.hints_remaining, 5);
    assert_eq!(state.current_index, 0);
    assert!(!state.submitted);
    assert!(state.summary.is_none());
    assert_eq!(state.time_remaining, 30 * 60);

    player
        .send_player(PlayerAction::StartQuiz {
            player_name: "Bagus Setyoko".to_string(),
        })
        .await;
    let state = player.recv_state().await;
    assert_eq!(state.phase, Phase::InProgress);
    assert_eq!(state.player_name, "Bagus Setyoko");

    assert_eq!(server.app_state.store.list_results().await.unwrap().len(), 1);
}
