use crate::{TestClient, TestServer};

use quiz_backend::model::client_message::{AdminAction, PlayerAction};
use quiz_backend::model::server_message::ServerMessage;
use quiz_backend::model::session::Phase;

async fn complete_quiz(server: &TestServer, name: &str, options: &[usize]) -> TestClient {
    let (mut player, _) = TestClient::start_quiz(server, name).await;
    player.answer_all(options).await;
    player.submit_confirmed().await;
    for _ in 0..3 {
        let _ = player.recv().await; // notices and leaderboard
    }
    player
}

#[tokio::test]
async fn dashboard_reconciles_names_against_the_roster() {
    let server = TestServer::start().await;
    let _a = complete_quiz(&server, "anri", &[0, 1, 2]).await;
    let _b = complete_quiz(&server, "Bagus  Setyoko", &[0, 0, 0]).await;
    let _c = complete_quiz(&server, "Aldo", &[0, 1, 2]).await;

    let (_admin, first) = TestClient::open_dashboard(&server).await;
    let ServerMessage::AdminView { view } = first else {
        panic!("Expected AdminView, got {first:?}");
    };

    assert_eq!(view.completed_count, 2);
    assert_eq!(view.pending_count, 1);

    let kirana = view
        .roster
        .iter()
        .find(|r| r.name == "KIRANA MAHARDIKA")
        .unwrap();
    assert!(!kirana.completed);
    let aldo = view.roster.iter().find(|r| r.name == "ALDO").unwrap();
    assert!(aldo.is_admin && aldo.is_excluded);

    let anri = view
        .results
        .iter()
        .find(|r| r.result.result.user_name == "anri")
        .unwrap();
    assert_eq!(anri.display_name, "ANRI RACHMAN");
    assert_eq!(anri.original_name.as_deref(), Some("anri"));
    assert!(anri.match_confidence.unwrap() >= 0.6);

    let bagus = view
        .results
        .iter()
        .find(|r| r.result.result.user_name == "Bagus  Setyoko")
        .unwrap();
    assert_eq!(bagus.display_name, "BAGUS SETYOKO");
    assert_eq!(bagus.match_confidence, None, "Whitespace variants match exactly");

    let ranked: Vec<&str> = view.rankings.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(ranked, vec!["ANRI RACHMAN", "BAGUS SETYOKO"]);

    assert_eq!(view.answer_key.len(), 3);
    assert_eq!(view.answer_key[2].correct, 2);
}

#[tokio::test]
async fn dashboard_lists_live_sessions_and_refreshes_on_request() {
    let server = TestServer::start().await;
    let (mut live, _) = TestClient::start_quiz(&server, "Kirana").await;
    live.send_player(PlayerAction::SelectAnswer {
        question_index: 0,
        option_index: 1,
    })
    .await;
    let _ = live.recv_state().await;
    // Connected but never started; not listed
    let (_idle, _) = TestClient::start_quiz(&server, "").await;

    let (mut admin, first) = TestClient::open_dashboard(&server).await;
    let ServerMessage::AdminView { view } = first else {
        panic!("Expected AdminView, got {first:?}");
    };
    assert_eq!(view.active_sessions.len(), 1);
    assert_eq!(view.active_sessions[0].player_name, "Kirana");
    assert_eq!(view.active_sessions[0].phase, Phase::InProgress);
    assert_eq!(view.active_sessions[0].answered, 1);
    assert!(view.results.is_empty());

    let _done = complete_quiz(&server, "Anri Rachman", &[0, 1, 2]).await;

    admin.send_admin(AdminAction::RefreshResults).await;
    match admin.recv().await {
        ServerMessage::AdminView { view } => {
            assert_eq!(view.results.len(), 1);
            assert_eq!(view.completed_count, 1);
            assert_eq!(view.pending_count, 2);
        }
        other => panic!("Expected AdminView, got {other:?}"),
    }
}

#[tokio::test]
async fn dashboard_refreshes_periodically() {
    let settings = quiz_backend::config::ServerSettings {
        refresh_interval: std::time::Duration::from_millis(100),
        ..Default::default()
    };
    let server = TestServer::start_with_settings(settings).await;
    let (mut admin, _) = TestClient::open_dashboard(&server).await;

    let _done = complete_quiz(&server, "Anri Rachman", &[0, 1, 2]).await;

    // Views keep arriving without asking; one of them sees the new result
    let mut saw_result = false;
    for _ in 0..10 {
        if let ServerMessage::AdminView { view } = admin.recv().await {
            if !view.results.is_empty() {
                saw_result = true;
                break;
            }
        }
    }
    assert!(saw_result);
}
