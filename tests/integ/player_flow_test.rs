use crate::{TestClient, TestServer};

use quiz_backend::bank::QuestionSource;
use quiz_backend::config::ServerSettings;
use quiz_backend::model::client_message::PlayerAction;
use quiz_backend::model::question::Category;
use quiz_backend::model::session::Phase;

#[tokio::test]
async fn start_quiz_returns_first_question() {
    let server = TestServer::start().await;
    let (_player, state) = TestClient::start_quiz(&server, "  Anri Rachman ").await;

    assert_eq!(state.phase, Phase::InProgress);
    assert_eq!(state.player_name, "Anri Rachman");
    assert_eq!(state.current_index, 0);
    assert_eq!(state.total_questions, 3);
    assert_eq!(state.answers, vec![None, None, None]);
    assert_eq!(state.time_remaining, 30 * 60);
    assert_eq!(state.hints_remaining, 5);
    assert!(!state.submitted);

    let question = state.question.expect("first question should be shown");
    assert_eq!(question.id, 1);
    assert_eq!(question.category, Category::Structure);
    assert_eq!(question.selected, None);
    assert_eq!(question.explanation, None, "Explanations stay hidden until a hint");

    assert_eq!(state.structure.total, 2);
    assert_eq!(state.written_expression.total, 1);
    assert!(state.summary.is_none());
}

#[tokio::test]
async fn blank_name_leaves_session_not_started() {
    let server = TestServer::start().await;
    let (mut player, state) = TestClient::start_quiz(&server, "   ").await;
    assert_eq!(state.phase, Phase::NotStarted);
    assert!(state.question.is_none());

    player
        .send_player(PlayerAction::StartQuiz {
            player_name: "Bagus".to_string(),
        })
        .await;
    let state = player.recv_state().await;
    assert_eq!(state.phase, Phase::InProgress);
    assert_eq!(state.player_name, "Bagus");
}

#[tokio::test]
async fn second_start_is_rejected() {
    let server = TestServer::start().await;
    let (mut player, _) = TestClient::start_quiz(&server, "Anri").await;

    player
        .send_player(PlayerAction::StartQuiz {
            player_name: "Someone Else".to_string(),
        })
        .await;
    assert_eq!(player.recv_error().await, "Quiz already started");
}

#[tokio::test]
async fn actions_before_start_are_rejected() {
    let server = TestServer::start().await;
    let (mut player, _) = TestClient::start_quiz(&server, "").await;

    player.send_player(PlayerAction::NextQuestion).await;
    assert_eq!(player.recv_error().await, "Quiz is not in progress");

    player.send_player(PlayerAction::SubmitQuiz).await;
    assert_eq!(player.recv_error().await, "Quiz is not in progress");
}

#[tokio::test]
async fn selecting_answers_updates_progress() {
    let server = TestServer::start().await;
    let (mut player, _) = TestClient::start_quiz(&server, "Anri").await;

    player
        .send_player(PlayerAction::SelectAnswer {
            question_index: 2,
            option_index: 3,
        })
        .await;
    let state = player.recv_state().await;
    assert_eq!(state.answers, vec![None, None, Some(3)]);
    assert_eq!(state.answered_count, 1);
    assert_eq!(state.written_expression.answered, 1);
    assert_eq!(state.structure.answered, 0);

    // Changing an answer replaces it
    player
        .send_player(PlayerAction::SelectAnswer {
            question_index: 2,
            option_index: 1,
        })
        .await;
    let state = player.recv_state().await;
    assert_eq!(state.answers, vec![None, None, Some(1)]);
    assert_eq!(state.answered_count, 1);
}

#[tokio::test]
async fn unreadable_bank_prevents_start() {
    let server = TestServer::start_with(
        QuestionSource::from_path("/nonexistent/questions.json".into()),
        ServerSettings::default(),
    )
    .await;
    let mut player = TestClient::connect(&server.ws_url()).await;
    player
        .send_player(PlayerAction::StartQuiz {
            player_name: "Anri".to_string(),
        })
        .await;

    let message = player.recv_error().await;
    assert!(
        message.contains("Failed to load questions"),
        "Unexpected error: {message}"
    );
    assert!(server.app_state.players.lock().await.is_empty());
}

#[tokio::test]
async fn disconnect_removes_session() {
    let server = TestServer::start().await;
    let (player, _) = TestClient::start_quiz(&server, "Anri").await;
    assert_eq!(server.app_state.players.lock().await.len(), 1);

    drop(player);
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert!(server.app_state.players.lock().await.is_empty());
}
