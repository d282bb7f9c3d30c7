use crate::{TestClient, TestServer};

use quiz_backend::model::client_message::PlayerAction;

#[tokio::test]
async fn navigation_is_clamped_to_the_question_range() {
    let server = TestServer::start().await;
    let (mut player, _) = TestClient::start_quiz(&server, "Anri").await;

    player.send_player(PlayerAction::PrevQuestion).await;
    assert_eq!(player.recv_state().await.current_index, 0);

    for expected in [1, 2, 2] {
        player.send_player(PlayerAction::NextQuestion).await;
        let state = player.recv_state().await;
        assert_eq!(state.current_index, expected);
        assert_eq!(state.question.unwrap().id, expected as u32 + 1);
    }

    player.send_player(PlayerAction::PrevQuestion).await;
    assert_eq!(player.recv_state().await.current_index, 1);
}

#[tokio::test]
async fn current_question_shows_selected_option() {
    let server = TestServer::start().await;
    let (mut player, _) = TestClient::start_quiz(&server, "Anri").await;

    player
        .send_player(PlayerAction::SelectAnswer {
            question_index: 1,
            option_index: 2,
        })
        .await;
    let state = player.recv_state().await;
    assert_eq!(state.question.unwrap().selected, None, "Still on question 0");

    player.send_player(PlayerAction::NextQuestion).await;
    let state = player.recv_state().await;
    assert_eq!(state.question.unwrap().selected, Some(2));
}

#[tokio::test]
async fn out_of_range_selections_are_rejected() {
    let server = TestServer::start().await;
    let (mut player, _) = TestClient::start_quiz(&server, "Anri").await;

    player
        .send_player(PlayerAction::SelectAnswer {
            question_index: 5,
            option_index: 0,
        })
        .await;
    assert_eq!(player.recv_error().await, "Question 5 does not exist");

    player
        .send_player(PlayerAction::SelectAnswer {
            question_index: 0,
            option_index: 9,
        })
        .await;
    assert_eq!(player.recv_error().await, "Question 0 has no option 9");

    // Nothing was recorded
    player.send_player(PlayerAction::NextQuestion).await;
    assert_eq!(player.recv_state().await.answers, vec![None, None, None]);
}
