use crate::{TestClient, TestServer};

use quiz_backend::model::client_message::AdminAction;

#[tokio::test]
async fn invalid_first_message_is_reported() {
    let server = TestServer::start().await;
    let mut client = TestClient::connect(&server.ws_url()).await;
    client.send_raw_text("{not json").await;

    let message = client.recv_error().await;
    assert!(message.starts_with("Invalid JSON"), "Got: {message}");
}

#[tokio::test]
async fn unknown_action_is_reported() {
    let server = TestServer::start().await;
    let mut client = TestClient::connect(&server.ws_url()).await;
    client
        .send_raw_text(r#"{"player": {"type": "skipAhead"}}"#)
        .await;

    let message = client.recv_error().await;
    assert!(message.starts_with("Invalid JSON"), "Got: {message}");
}

#[tokio::test]
async fn invalid_message_mid_session_leaves_session_intact() {
    let server = TestServer::start().await;
    let (mut player, _) = TestClient::start_quiz(&server, "Anri").await;

    player
        .send_raw_text(r#"{"player": {"type": "selectAnswer", "questionIndex": "zero"}}"#)
        .await;
    let message = player.recv_error().await;
    assert!(message.starts_with("Invalid JSON"), "Got: {message}");

    player
        .send_player(quiz_backend::model::client_message::PlayerAction::NextQuestion)
        .await;
    assert_eq!(player.recv_state().await.current_index, 1);
}

#[tokio::test]
async fn admin_message_from_player_is_rejected() {
    let server = TestServer::start().await;
    let (mut player, _) = TestClient::start_quiz(&server, "Anri").await;

    player.send_admin(AdminAction::RefreshResults).await;
    assert_eq!(
        player.recv_error().await,
        "Unexpected message type: expected Player message"
    );
}
